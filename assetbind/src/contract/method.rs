//! Implementation for a contract method builder and call future. This is not
//! intended to be used directly but to be used by a contract `Instance` with
//! [Instance::method](crate::contract::Instance::method).

use crate::errors::{Capability, ExecutionError, MethodError, Revert};
use crate::tokens::Tokenize;
use crate::transport::{
    BlockId, BlockNumber, CallOutcome, CallRequest, ContractCaller, ContractTransactor,
    TransactionHandle, TransactionRequest,
};
use assetbind_common::abi::{Function, StateMutability, Token};
use assetbind_common::{Address, U256};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// Default options to be applied to `MethodBuilder` or `ViewMethodBuilder`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MethodDefaults {
    /// Default sender of calls and transactions.
    pub from: Option<Address>,
    /// Default gas amount to use for transactions.
    pub gas: Option<U256>,
    /// Default gas price to use for transactions.
    pub gas_price: Option<U256>,
}

impl MethodDefaults {
    /// The defaults as call options against the latest block.
    pub fn call_options(&self) -> CallOptions {
        CallOptions {
            from: self.from,
            block: None,
        }
    }

    /// The defaults as transaction options.
    pub fn transaction_options(&self) -> TransactionOptions {
        TransactionOptions {
            from: self.from,
            gas: self.gas,
            gas_price: self.gas_price,
            ..Default::default()
        }
    }
}

/// Options for a read-only call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CallOptions {
    /// The account the call is made from.
    pub from: Option<Address>,
    /// The block to call against. Defaults to the latest block.
    pub block: Option<BlockId>,
}

/// Options for a transaction. Unset fields are left for the transport to
/// fill in.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TransactionOptions {
    /// The sender.
    pub from: Option<Address>,
    /// The gas limit.
    pub gas: Option<U256>,
    /// The gas price.
    pub gas_price: Option<U256>,
    /// The value in wei to send.
    pub value: Option<U256>,
    /// The sender nonce.
    pub nonce: Option<U256>,
}

impl TransactionOptions {
    /// Fills unset options from the method defaults.
    pub fn with_defaults(mut self, defaults: &MethodDefaults) -> Self {
        self.from = self.from.or(defaults.from);
        self.gas = self.gas.or(defaults.gas);
        self.gas_price = self.gas_price.or(defaults.gas_price);
        self
    }

    fn into_request(self, to: Address, data: Vec<u8>) -> TransactionRequest {
        TransactionRequest {
            from: self.from,
            to,
            gas: self.gas,
            gas_price: self.gas_price,
            value: self.value,
            nonce: self.nonce,
            data,
        }
    }
}

/// Data used for building a contract method call or transaction. The method
/// builder can be demoted into a `ViewMethodBuilder` to not allow sending of
/// transactions. This is useful when dealing with view functions.
#[derive(Debug, Clone)]
#[must_use = "methods do nothing unless you `.call()` or `.send()` them"]
pub struct MethodBuilder<R: Tokenize> {
    function: Function,
    address: Address,
    data: Vec<u8>,
    caller: Option<Arc<dyn ContractCaller>>,
    transactor: Option<Arc<dyn ContractTransactor>>,
    /// transaction parameters
    pub tx: TransactionOptions,
    _result: PhantomData<fn() -> R>,
}

impl MethodBuilder<()> {
    /// Creates a new builder for a plain value transfer to the contract,
    /// with empty call data.
    pub fn transfer(address: Address, transactor: Option<Arc<dyn ContractTransactor>>) -> Self {
        // Only used for error formatting, the transfer carries no selector.
        let function = Function {
            name: "receive".to_owned(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            state_mutability: StateMutability::Payable,
        };
        MethodBuilder::new(function, address, Vec::new()).with_transactor(transactor)
    }
}

impl<R: Tokenize> MethodBuilder<R> {
    /// Creates a new builder for a transaction with already encoded call
    /// data.
    pub fn new(function: Function, address: Address, data: Vec<u8>) -> Self {
        MethodBuilder {
            function,
            address,
            data,
            caller: None,
            transactor: None,
            tx: TransactionOptions::default(),
            _result: PhantomData,
        }
    }

    /// Sets the capability used by `call`.
    pub fn with_caller(mut self, caller: Option<Arc<dyn ContractCaller>>) -> Self {
        self.caller = caller;
        self
    }

    /// Sets the capability used by `send`.
    pub fn with_transactor(mut self, transactor: Option<Arc<dyn ContractTransactor>>) -> Self {
        self.transactor = transactor;
        self
    }

    /// Apply method defaults to this builder.
    pub fn with_defaults(mut self, defaults: &MethodDefaults) -> Self {
        self.tx = self.tx.with_defaults(defaults);
        self
    }

    /// Replaces all transaction options.
    pub fn options(mut self, options: TransactionOptions) -> Self {
        self.tx = options;
        self
    }

    /// Specify the sender of the transaction.
    pub fn from(mut self, value: Address) -> Self {
        self.tx.from = Some(value);
        self
    }

    /// Specify amount of gas to use, if not specified then the node picks one.
    pub fn gas(mut self, value: U256) -> Self {
        self.tx.gas = Some(value);
        self
    }

    /// Specify the gas price to use, if not specified then the node picks one.
    pub fn gas_price(mut self, value: U256) -> Self {
        self.tx.gas_price = Some(value);
        self
    }

    /// Specify what value in wei to send along with the transaction.
    pub fn value(mut self, value: U256) -> Self {
        self.tx.value = Some(value);
        self
    }

    /// Specify the nonce for the transaction, if not specified will use the
    /// current transaction count for the signing account.
    pub fn nonce(mut self, value: U256) -> Self {
        self.tx.nonce = Some(value);
        self
    }

    /// Returns a reference to the underling ABI function for this call.
    pub fn function(&self) -> &Function {
        &self.function
    }

    /// The encoded call data: the selector followed by the arguments.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign (if required) and send the method call transaction.
    pub async fn send(self) -> Result<TransactionHandle, MethodError> {
        let MethodBuilder {
            function,
            address,
            data,
            transactor,
            tx,
            ..
        } = self;
        let request = tx.into_request(address, data);
        execute_transaction(transactor.as_ref(), &function, request)
            .await
            .map_err(|err| MethodError::new(&function, err))
    }

    /// Demotes a `MethodBuilder` into a `ViewMethodBuilder` which has a more
    /// restricted API and cannot actually send transactions.
    pub fn view(self) -> ViewMethodBuilder<R> {
        ViewMethodBuilder::from_method(self)
    }

    /// Call a contract method. Contract calls do not modify the blockchain and
    /// as such do not require gas or signing. Note that doing a call with a
    /// block number requires first demoting the `MethodBuilder` into a
    /// `ViewMethodBuilder` and setting the block number for the call.
    pub async fn call(self) -> Result<R, MethodError> {
        self.view().call().await
    }
}

/// Data used for building a contract method call. The view method builder
/// can't directly send transactions and is for read only method calls.
#[derive(Debug, Clone)]
#[must_use = "view methods do nothing unless you `.call()` them"]
pub struct ViewMethodBuilder<R: Tokenize> {
    /// method parameters
    pub m: MethodBuilder<R>,
    /// optional block number
    pub block: Option<BlockId>,
}

impl<R: Tokenize> ViewMethodBuilder<R> {
    /// Create a new `ViewMethodBuilder` by demoting a `MethodBuilder`.
    pub fn from_method(method: MethodBuilder<R>) -> Self {
        ViewMethodBuilder {
            m: method,
            block: None,
        }
    }

    /// Apply method defaults to this builder.
    pub fn with_defaults(mut self, defaults: &MethodDefaults) -> Self {
        self.m = self.m.with_defaults(defaults);
        self
    }

    /// Replaces the sender and block of the call.
    pub fn options(mut self, options: CallOptions) -> Self {
        self.m.tx.from = options.from;
        self.block = options.block;
        self
    }

    /// Specify the account the transaction is being sent from.
    pub fn from(mut self, value: Address) -> Self {
        self.m = self.m.from(value);
        self
    }

    /// Specify the block height for the call, if not specified then latest
    /// mined block will be used.
    pub fn block(mut self, value: BlockId) -> Self {
        self.block = Some(value);
        self
    }

    /// Returns a reference to the underling ABI function for this call.
    pub fn function(&self) -> &Function {
        &self.m.function
    }

    /// Call a contract method. Contract calls do not modify the blockchain and
    /// as such do not require gas or signing.
    pub async fn call(self) -> Result<R, MethodError> {
        let ViewMethodBuilder { m, block } = self;
        let MethodBuilder {
            function,
            address,
            data,
            caller,
            tx,
            ..
        } = m;
        let request = CallRequest {
            from: tx.from,
            to: address,
            data,
        };

        let result = async {
            let tokens = execute_call(caller.as_ref(), &function, request, block).await?;
            let token = convert_response(tokens);
            Ok::<_, ExecutionError>(R::from_token(token)?)
        };
        result.await.map_err(|err| MethodError::new(&function, err))
    }
}

/// Executes a read-only call and decodes its return data against the
/// function outputs.
pub(crate) async fn execute_call(
    caller: Option<&Arc<dyn ContractCaller>>,
    function: &Function,
    request: CallRequest,
    block: Option<BlockId>,
) -> Result<Vec<Token>, ExecutionError> {
    let caller = caller.ok_or(ExecutionError::MissingCapability(Capability::Caller))?;
    let block = block.unwrap_or(BlockId::Number(BlockNumber::Latest));
    debug!(
        selector = %hex::encode(function.selector()),
        address = ?request.to,
        block = ?block,
        "calling contract method",
    );

    match caller.call(request, block).await? {
        CallOutcome::Return(data) => Ok(function.decode_output(&data)?),
        CallOutcome::Revert(data) => Err(ExecutionError::ContractReverted(Revert::new(data))),
    }
}

/// Submits a transaction without waiting for it to be mined.
pub(crate) async fn execute_transaction(
    transactor: Option<&Arc<dyn ContractTransactor>>,
    function: &Function,
    request: TransactionRequest,
) -> Result<TransactionHandle, ExecutionError> {
    let transactor =
        transactor.ok_or(ExecutionError::MissingCapability(Capability::Transactor))?;
    debug!(
        method = %function.name,
        address = ?request.to,
        value = ?request.value,
        "submitting transaction",
    );
    Ok(transactor.submit(request).await?)
}

/// Converts the decoded outputs of a function into a single token: nothing
/// becomes the empty tuple, a single output stays as is and several outputs
/// become a tuple.
pub(crate) fn convert_response(mut tokens: Vec<Token>) -> Token {
    match tokens.len() {
        0 => Token::Tuple(Vec::new()),
        1 => tokens.remove(0),
        _ => Token::Tuple(tokens),
    }
}
