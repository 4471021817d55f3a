//! Abstraction for interacting with deployed asset contracts. Provides
//! methods for sending transactions to contracts, querying current contract
//! state and filtering or watching contract events.

mod event;
mod method;

use crate::errors::{Capability, EventError, ExecutionError, MethodError};
use crate::tokens::Tokenize;
use crate::transport::{
    BlockId, CallRequest, ContractCaller, ContractFilterer, ContractTransactor, TransactionHandle,
    Transport,
};
use assetbind_common::abi::{Function, Token};
use assetbind_common::hash::H32;
use assetbind_common::{Abi, Address, H256};
use std::sync::Arc;

pub(crate) use self::event::LogDecoder;
pub use self::event::{
    AllEventsBuilder, DecodeLog, EventBuilder, EventIterator, EventStatus, FilterOptions,
    IteratorState, ParseLog, Topic,
};
pub use self::method::{
    CallOptions, MethodBuilder, MethodDefaults, TransactionOptions, ViewMethodBuilder,
};

/// Represents a contract instance at an address. Provides methods for
/// contract interaction.
///
/// An instance holds up to three capabilities. Operations that need a
/// capability the instance was not bound with fail with
/// [`ExecutionError::MissingCapability`].
#[derive(Debug, Clone)]
pub struct Instance {
    address: Address,
    abi: Arc<Abi>,
    caller: Option<Arc<dyn ContractCaller>>,
    transactor: Option<Arc<dyn ContractTransactor>>,
    filterer: Option<Arc<dyn ContractFilterer>>,
    /// Default method parameters to use when sending method transactions or
    /// querying method calls.
    pub defaults: MethodDefaults,
}

impl Instance {
    /// Creates a new contract instance bound with all capabilities of the
    /// transport.
    ///
    /// Note that this does not verify that a contract with a matching `Abi` is
    /// actually deployed at the given address.
    pub fn at<T>(transport: Arc<T>, abi: Arc<Abi>, address: Address) -> Self
    where
        T: Transport + 'static,
    {
        Instance::new(abi, address)
            .with_caller(transport.clone())
            .with_transactor(transport.clone())
            .with_filterer(transport)
    }

    /// Creates a new contract instance without any capabilities.
    pub fn new(abi: Arc<Abi>, address: Address) -> Self {
        Instance {
            address,
            abi,
            caller: None,
            transactor: None,
            filterer: None,
            defaults: MethodDefaults::default(),
        }
    }

    /// Binds the caller capability.
    pub fn with_caller(mut self, caller: Arc<dyn ContractCaller>) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Binds the transactor capability.
    pub fn with_transactor(mut self, transactor: Arc<dyn ContractTransactor>) -> Self {
        self.transactor = Some(transactor);
        self
    }

    /// Binds the filterer capability.
    pub fn with_filterer(mut self, filterer: Arc<dyn ContractFilterer>) -> Self {
        self.filterer = Some(filterer);
        self
    }

    /// Retrieves the contract ABI for this instance.
    pub fn abi(&self) -> &Arc<Abi> {
        &self.abi
    }

    /// Returns the contract address being used by this instance.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The caller capability, if bound.
    pub fn caller(&self) -> Option<&Arc<dyn ContractCaller>> {
        self.caller.as_ref()
    }

    /// The transactor capability, if bound.
    pub fn transactor(&self) -> Option<&Arc<dyn ContractTransactor>> {
        self.transactor.as_ref()
    }

    /// The filterer capability, if bound.
    pub fn filterer(&self) -> Option<&Arc<dyn ContractFilterer>> {
        self.filterer.as_ref()
    }

    /// Returns a copy of this instance that keeps only the given capability.
    /// Generated facets are built this way.
    pub fn only(&self, capability: Capability) -> Self {
        let mut instance = Instance::new(self.abi.clone(), self.address);
        instance.defaults = self.defaults.clone();
        match capability {
            Capability::Caller => instance.caller = self.caller.clone(),
            Capability::Transactor => instance.transactor = self.transactor.clone(),
            Capability::Filterer => instance.filterer = self.filterer.clone(),
        }
        instance
    }

    /// Mutable access to the method defaults.
    pub fn defaults_mut(&mut self) -> &mut MethodDefaults {
        &mut self.defaults
    }

    /// Executes a read-only call of the function with the given name and
    /// returns the decoded outputs.
    ///
    /// State changing functions are rejected, see
    /// [`Instance::call_unchecked`] for calling them anyway.
    pub async fn call(
        &self,
        name: &str,
        tokens: Vec<Token>,
        block: Option<BlockId>,
    ) -> Result<Vec<Token>, MethodError> {
        let function = self.function(name)?;
        if !function.is_constant() {
            return Err(MethodError::new(
                function,
                ExecutionError::NotView(function.name.clone()),
            ));
        }
        self.call_function(function, tokens, block).await
    }

    /// Executes a read-only call of any function, including state changing
    /// ones, for simulating its outcome.
    pub async fn call_unchecked(
        &self,
        name: &str,
        tokens: Vec<Token>,
        block: Option<BlockId>,
    ) -> Result<Vec<Token>, MethodError> {
        let function = self.function(name)?;
        self.call_function(function, tokens, block).await
    }

    async fn call_function(
        &self,
        function: &Function,
        tokens: Vec<Token>,
        block: Option<BlockId>,
    ) -> Result<Vec<Token>, MethodError> {
        let result = async {
            let data = function.encode_input(&tokens).map_err(ExecutionError::from)?;
            let request = CallRequest {
                from: self.defaults.from,
                to: self.address,
                data,
            };
            method::execute_call(self.caller.as_ref(), function, request, block).await
        };
        result.await.map_err(|err| MethodError::new(function, err))
    }

    /// Submits a transaction invoking the function with the given name.
    ///
    /// The options are passed through as is, method defaults are not
    /// applied. Returns once the transport accepted the transaction.
    pub async fn transact(
        &self,
        name: &str,
        tokens: Vec<Token>,
        options: TransactionOptions,
    ) -> Result<TransactionHandle, MethodError> {
        let function = self.function(name)?;
        if self.transactor.is_none() {
            return Err(MethodError::new(
                function,
                ExecutionError::MissingCapability(Capability::Transactor),
            ));
        }
        let data = function
            .encode_input(&tokens)
            .map_err(|err| MethodError::new(function, err))?;
        MethodBuilder::<()>::new(function.clone(), self.address, data)
            .with_transactor(self.transactor.clone())
            .options(options)
            .send()
            .await
    }

    /// Sends a plain value transfer with empty call data.
    ///
    /// This is available for every contract regardless of whether its ABI
    /// declares a `receive` or `fallback` function; a contract without one
    /// reverts the transfer.
    pub async fn raw_transfer(
        &self,
        options: TransactionOptions,
    ) -> Result<TransactionHandle, MethodError> {
        MethodBuilder::transfer(self.address, self.transactor.clone())
            .options(options)
            .send()
            .await
    }

    /// Returns a method builder to setup a call or transaction on a smart
    /// contract method. Note that calls just get evaluated on a node but do
    /// not actually commit anything to the block chain.
    pub fn method<P, R>(&self, selector: H32, params: P) -> Result<MethodBuilder<R>, MethodError>
    where
        P: Tokenize,
        R: Tokenize,
    {
        let function = self.abi.function_by_selector(&selector).ok_or_else(|| {
            MethodError::from_parts(
                format!("0x{}", hex::encode(selector)),
                ExecutionError::UnknownSelector(selector),
            )
        })?;
        let tokens = match params.into_token() {
            Token::Tuple(tokens) => tokens,
            token => vec![token],
        };
        let data = function
            .encode_input(&tokens)
            .map_err(|err| MethodError::new(function, err))?;

        Ok(MethodBuilder::new(function.clone(), self.address, data)
            .with_caller(self.caller.clone())
            .with_transactor(self.transactor.clone())
            .with_defaults(&self.defaults))
    }

    /// Returns a view method builder to setup a call to a smart contract. View
    /// method builders can't actually send transactions and only query contract
    /// state.
    pub fn view_method<P, R>(
        &self,
        selector: H32,
        params: P,
    ) -> Result<ViewMethodBuilder<R>, MethodError>
    where
        P: Tokenize,
        R: Tokenize,
    {
        Ok(self.method(selector, params)?.view())
    }

    /// Returns a event builder to setup an event query, iterator or
    /// subscription for the event with the given topic 0.
    pub fn event<E>(&self, topic: H256) -> Result<EventBuilder<E>, EventError>
    where
        E: DecodeLog,
    {
        let event = self.abi.event_by_topic(&topic).ok_or_else(|| {
            EventError::from_parts(
                format!("{:?}", topic),
                ExecutionError::UnknownEvent(format!("{:?}", topic)),
            )
        })?;
        Ok(EventBuilder::new(
            event.clone(),
            self.address,
            self.filterer.clone(),
        ))
    }

    /// Returns a log builder for any event of the contract.
    pub fn all_events<E>(&self) -> AllEventsBuilder<E>
    where
        E: ParseLog,
    {
        AllEventsBuilder::new(self.address, self.filterer.clone())
    }

    fn function(&self, name: &str) -> Result<&Function, MethodError> {
        self.abi.find_function(name).ok_or_else(|| {
            MethodError::from_parts(
                name.to_owned(),
                ExecutionError::UnknownMethod(name.to_owned()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, RevertReason};
    use crate::test::prelude::*;
    use crate::transport::{BlockNumber, CallOutcome, Log, TransactionRequest};
    use assetbind_common::U256;

    const ABI: &str = r#"[
        {
            "type": "function",
            "name": "balanceOf",
            "inputs": [
                { "name": "account", "type": "address" },
                { "name": "id", "type": "uint256" }
            ],
            "outputs": [{ "name": "", "type": "uint256" }],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "safeTransferFrom",
            "inputs": [
                { "name": "from", "type": "address" },
                { "name": "to", "type": "address" },
                { "name": "id", "type": "uint256" },
                { "name": "value", "type": "uint256" },
                { "name": "data", "type": "bytes" }
            ],
            "outputs": [],
            "stateMutability": "nonpayable"
        },
        {
            "type": "event",
            "name": "URI",
            "inputs": [
                { "name": "value", "type": "string", "indexed": false },
                { "name": "id", "type": "uint256", "indexed": true }
            ],
            "anonymous": false
        },
        {
            "type": "error",
            "name": "OwnableUnauthorizedAccount",
            "inputs": [{ "name": "account", "type": "address" }]
        }
    ]"#;

    fn instance(node: &TestNode) -> Instance {
        let abi = Arc::new(Abi::build(ABI).unwrap());
        Instance::at(Arc::new(node.clone()), abi, Address::repeat_byte(0x42))
    }

    fn word(value: u64) -> Vec<u8> {
        let mut word = [0u8; 32];
        U256::from(value).to_big_endian(&mut word);
        word.to_vec()
    }

    #[tokio::test]
    async fn untyped_call() {
        let node = TestNode::new();
        node.add_call_outcome(Ok(CallOutcome::Return(word(7))));

        let outputs = instance(&node)
            .call(
                "balanceOf",
                vec![Token::Address(Address::repeat_byte(1)), Token::Uint(1.into())],
                Some(BlockId::Number(BlockNumber::Pending)),
            )
            .await
            .unwrap();
        assert_eq!(outputs, vec![Token::Uint(7.into())]);

        let (request, block) = node.calls().remove(0);
        assert_eq!(request.to, Address::repeat_byte(0x42));
        assert_eq!(&request.data[..4], &hex_literal::hex!("00fdd58e"));
        assert_eq!(request.data.len(), 4 + 64);
        assert_eq!(block, BlockId::Number(BlockNumber::Pending));
    }

    #[tokio::test]
    async fn untyped_call_rejects_unknown_and_mutating_methods() {
        let node = TestNode::new();
        let instance = instance(&node);

        let err = instance.call("mint", vec![], None).await.unwrap_err();
        assert!(matches!(err.inner, ExecutionError::UnknownMethod(_)));

        let err = instance
            .call("safeTransferFrom", vec![], None)
            .await
            .unwrap_err();
        assert!(matches!(err.inner, ExecutionError::NotView(_)));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(node.calls().is_empty());
    }

    #[tokio::test]
    async fn untyped_call_checks_arguments_before_calling() {
        let node = TestNode::new();
        let err = instance(&node)
            .call("balanceOf", vec![Token::Bool(true)], None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert!(node.calls().is_empty());
    }

    #[tokio::test]
    async fn call_unchecked_simulates_transactions() {
        let node = TestNode::new();
        node.add_call_outcome(Ok(CallOutcome::Return(Vec::new())));

        let outputs = instance(&node)
            .call_unchecked(
                "safeTransferFrom",
                vec![
                    Token::Address(Address::repeat_byte(1)),
                    Token::Address(Address::repeat_byte(2)),
                    Token::Uint(1.into()),
                    Token::Uint(2.into()),
                    Token::Bytes(Vec::new()),
                ],
                None,
            )
            .await
            .unwrap();
        assert!(outputs.is_empty());
        assert_eq!(node.calls()[0].1, BlockId::Number(BlockNumber::Latest));
    }

    #[tokio::test]
    async fn typed_call_resolves_custom_errors() {
        let node = TestNode::new();
        let mut payload = hex_literal::hex!("118cdaa7").to_vec();
        payload.extend(H256::from(Address::repeat_byte(1)).as_bytes());
        node.add_call_outcome(Ok(CallOutcome::Revert(payload)));

        let instance = instance(&node);
        let err = instance
            .view_method::<_, U256>(
                hex_literal::hex!("00fdd58e"),
                (Address::repeat_byte(1), U256::from(1)),
            )
            .unwrap()
            .call()
            .await
            .unwrap_err();

        let revert = err.inner.as_revert().unwrap();
        let (error, arguments) = revert.resolve(instance.abi()).unwrap();
        assert_eq!(error.name, "OwnableUnauthorizedAccount");
        assert_eq!(arguments, vec![Token::Address(Address::repeat_byte(1))]);
        assert!(matches!(revert.decode::<()>(), RevertReason::Unknown(_)));
    }

    #[test]
    fn method_rejects_unknown_selectors() {
        let node = TestNode::new();
        let err = instance(&node)
            .method::<_, ()>([0xde, 0xad, 0xbe, 0xef], ())
            .unwrap_err();
        assert!(matches!(
            err.inner,
            ExecutionError::UnknownSelector([0xde, 0xad, 0xbe, 0xef])
        ));
        assert_eq!(err.signature, "0xdeadbeef");
    }

    #[tokio::test]
    async fn transact_passes_options_through() {
        let node = TestNode::new();
        let mut instance = instance(&node);
        instance.defaults_mut().gas = Some(1_000_000.into());

        let options = TransactionOptions {
            from: Some(Address::repeat_byte(1)),
            value: Some(3.into()),
            ..Default::default()
        };
        let handle = instance
            .transact(
                "safeTransferFrom",
                vec![
                    Token::Address(Address::repeat_byte(1)),
                    Token::Address(Address::repeat_byte(2)),
                    Token::Uint(1.into()),
                    Token::Uint(2.into()),
                    Token::Bytes(vec![0xff]),
                ],
                options,
            )
            .await
            .unwrap();
        assert_eq!(handle.hash, H256::from_low_u64_be(1));

        let request = node.transactions().remove(0);
        assert_eq!(&request.data[..4], &hex_literal::hex!("f242432a"));
        assert_eq!(request.from, Some(Address::repeat_byte(1)));
        assert_eq!(request.value, Some(3.into()));
        assert_eq!(request.gas, None);
    }

    #[tokio::test]
    async fn raw_transfer_sends_value_with_empty_data() {
        let node = TestNode::new();
        instance(&node)
            .raw_transfer(TransactionOptions {
                value: Some(U256::exp10(18)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            node.transactions(),
            vec![TransactionRequest {
                to: Address::repeat_byte(0x42),
                value: Some(U256::exp10(18)),
                ..Default::default()
            }]
        );
    }

    #[tokio::test]
    async fn missing_capabilities() {
        let abi = Arc::new(Abi::build(ABI).unwrap());
        let node = TestNode::new();
        let read_only = Instance::new(abi, Address::zero()).with_caller(Arc::new(node.clone()));

        let err = read_only
            .transact("safeTransferFrom", vec![], TransactionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.inner,
            ExecutionError::MissingCapability(Capability::Transactor)
        ));
        assert_eq!(err.kind(), ErrorKind::Configuration);

        let err = read_only
            .event::<Log>(assetbind_common::hash::event_topic("URI(string,uint256)"))
            .unwrap()
            .iter()
            .unwrap_err();
        assert!(matches!(
            err.inner,
            ExecutionError::MissingCapability(Capability::Filterer)
        ));
        assert!(node.transactions().is_empty());
    }

    #[tokio::test]
    async fn events_by_topic() {
        let node = TestNode::new();
        let instance = instance(&node);
        assert!(instance.event::<Log>(H256::zero()).is_err());

        node.add_logs(vec![]);
        let mut events = instance
            .event::<Log>(assetbind_common::hash::event_topic("URI(string,uint256)"))
            .unwrap()
            .topic0(Topic::This(U256::from(5)))
            .iter()
            .unwrap();
        assert!(events.next().await.is_none());

        let filter = node.filters().remove(0);
        assert_eq!(filter.address, Address::repeat_byte(0x42));
        assert_eq!(filter.topics.topic1, Topic::This(H256::from_low_u64_be(5)));
    }

    #[test]
    fn facets_keep_a_single_capability() {
        let node = TestNode::new();
        let mut full = instance(&node);
        full.defaults_mut().from = Some(Address::repeat_byte(1));

        let caller = full.only(Capability::Caller);
        assert!(caller.caller().is_some());
        assert!(caller.transactor().is_none());
        assert!(caller.filterer().is_none());
        assert_eq!(caller.defaults, full.defaults);

        let filterer = full.only(Capability::Filterer);
        assert!(filterer.caller().is_none());
        assert!(filterer.filterer().is_some());
        assert_eq!(filterer.address(), full.address());
    }
}
