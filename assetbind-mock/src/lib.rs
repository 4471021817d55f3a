#![deny(missing_docs, unsafe_code)]

//! This crate allows mocking the node behind generated contract bindings.
//!
//! [`MockNode`] is a [`mockall`] mock of the three transport capabilities a
//! binding is bound with. Expectations are set up the usual `mockall` way and
//! the helpers in this crate produce the encoded responses a node would give.
//!
//! # Example
//!
//! ```ignore
//! use assetbind_mock::{predicate, MockNode};
//! use mockall::predicate::always;
//! use std::sync::Arc;
//!
//! assetbind::contract!("abi/Equity.json");
//!
//! let abi = equity::abi();
//! let balance_of = abi.find_function("balanceOf").unwrap();
//!
//! let mut node = MockNode::new();
//! node.expect_call()
//!     .with(predicate::calls(balance_of), always())
//!     .returning({
//!         let balance_of = balance_of.clone();
//!         move |_, _| assetbind_mock::returns(&balance_of, U256::from(42))
//!     });
//!
//! let equity = Equity::at(Arc::new(node), address);
//! assert_eq!(equity.balance_of(holder, 1.into()).call().await?, 42.into());
//! ```
//!
//! # Mocking events
//!
//! Historical logs are returned from `filter_logs` expectations with
//! [`logs`]. Live subscriptions are fed through a [`LogFeed`], created
//! together with the subscription handed out by `subscribe_logs`:
//!
//! ```ignore
//! let (feed, subscription) = assetbind_mock::log_feed();
//! node.expect_subscribe_logs()
//!     .return_once(move |_| assetbind_mock::subscribed(subscription));
//!
//! // later, from the test body
//! feed.push(log);
//! ```

pub mod predicate;

#[cfg(test)]
mod test;

use assetbind::common::abi::{self, AbiError, Event, Function, Token};
use assetbind::common::hash;
use assetbind::errors::EncodeError;
use assetbind::futures::channel::mpsc;
use assetbind::futures::future::{self, BoxFuture, FutureExt as _};
use assetbind::futures::stream::{self, BoxStream, StreamExt as _};
use assetbind::tokens::Tokenize;
use assetbind::transport::{CallOutcome, LogSubscription, TransportError};
use assetbind::{Address, Log, TransactionHandle, H256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use self::node::MockNode;

#[allow(missing_docs)]
mod node {
    use assetbind::futures::future::BoxFuture;
    use assetbind::futures::stream::BoxStream;
    use assetbind::transport::{
        BlockId, CallOutcome, CallRequest, ContractCaller, ContractFilterer, ContractTransactor,
        LogFilter, LogSubscription, TransactionRequest, TransportError,
    };
    use assetbind::{Log, TransactionHandle};

    mockall::mock! {
        /// Mock node implementing every transport capability.
        ///
        /// Set up expectations with `expect_call`, `expect_submit`,
        /// `expect_filter_logs` and `expect_subscribe_logs`, then move the node
        /// into an `Arc` to bind contracts to it. Unmatched requests panic.
        pub Node {}

        impl ContractCaller for Node {
            fn call(
                &self,
                request: CallRequest,
                block: BlockId,
            ) -> BoxFuture<'static, Result<CallOutcome, TransportError>>;
        }

        impl ContractTransactor for Node {
            fn submit(
                &self,
                request: TransactionRequest,
            ) -> BoxFuture<'static, Result<TransactionHandle, TransportError>>;
        }

        impl ContractFilterer for Node {
            fn filter_logs(&self, filter: LogFilter) -> BoxStream<'static, Result<Log, TransportError>>;

            fn subscribe_logs(
                &self,
                filter: LogFilter,
            ) -> BoxFuture<'static, Result<LogSubscription, TransportError>>;
        }
    }

    impl std::fmt::Debug for MockNode {
        fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.debug_struct("MockNode").finish()
        }
    }
}

/// Splits a value into one token per parameter, the way the runtime joins
/// them back together when decoding.
fn tokens_for<T: Tokenize>(count: usize, value: T) -> Vec<Token> {
    match (count, value.into_token()) {
        (0, _) => Vec::new(),
        (1, token) => vec![token],
        (_, Token::Tuple(tokens)) => tokens,
        (_, token) => vec![token],
    }
}

fn encode_failure(err: EncodeError) -> TransportError {
    TransportError::Other(format!("mock response encoding failed: {}", err))
}

/// A call response returning `value` from `function`.
///
/// Functions with several outputs take a tuple or an output struct.
pub fn returns<R: Tokenize>(
    function: &Function,
    value: R,
) -> BoxFuture<'static, Result<CallOutcome, TransportError>> {
    let tokens = tokens_for(function.outputs.len(), value);
    let outcome = function
        .encode_output(&tokens)
        .map(CallOutcome::Return)
        .map_err(encode_failure);
    future::ready(outcome).boxed()
}

/// A call response reverting with raw data.
pub fn reverts(data: Vec<u8>) -> BoxFuture<'static, Result<CallOutcome, TransportError>> {
    future::ready(Ok(CallOutcome::Revert(data))).boxed()
}

/// A call response reverting with the built-in `Error(string)`.
pub fn reverts_with_reason(reason: &str) -> BoxFuture<'static, Result<CallOutcome, TransportError>> {
    reverts(assetbind::errors::encode_reason(reason))
}

/// A call response reverting with a custom error of the contract.
pub fn reverts_with<A: Tokenize>(
    error: &AbiError,
    arguments: A,
) -> BoxFuture<'static, Result<CallOutcome, TransportError>> {
    let tokens = tokens_for(error.inputs.len(), arguments);
    let outcome = error
        .encode(&tokens)
        .map(CallOutcome::Revert)
        .map_err(encode_failure);
    future::ready(outcome).boxed()
}

/// A transaction response accepting the transaction under `hash`.
pub fn accepted(hash: H256) -> BoxFuture<'static, Result<TransactionHandle, TransportError>> {
    future::ready(Ok(TransactionHandle { hash })).boxed()
}

/// Any response failing with a transport error.
pub fn fails<T: Send + 'static>(err: TransportError) -> BoxFuture<'static, Result<T, TransportError>> {
    future::ready(Err(err)).boxed()
}

/// A log query response yielding `logs` in order.
pub fn logs(logs: Vec<Log>) -> BoxStream<'static, Result<Log, TransportError>> {
    stream::iter(logs.into_iter().map(Ok)).boxed()
}

/// A subscription response handing out `subscription`.
pub fn subscribed(
    subscription: LogSubscription,
) -> BoxFuture<'static, Result<LogSubscription, TransportError>> {
    future::ready(Ok(subscription)).boxed()
}

/// Encodes a log of `event` emitted by `address`.
///
/// The values are all event parameters in declaration order, as a tuple for
/// events with several parameters. Indexed parameters end up in the topics,
/// reference types hashed, and the rest in the log data.
pub fn event_log<V: Tokenize>(address: Address, event: &Event, values: V) -> Result<Log, EncodeError> {
    let tokens = tokens_for(event.inputs.len(), values);

    let mut topics = Vec::with_capacity(event.topic_count());
    if !event.anonymous {
        topics.push(event.signature());
    }
    let mut types = Vec::new();
    let mut data = Vec::new();
    for (param, token) in event.inputs.iter().zip(tokens) {
        if param.indexed {
            topics.push(abi::encode_topic(param.kind(), &token, param.name())?);
        } else {
            types.push(param.kind().clone());
            data.push(token);
        }
    }

    Ok(Log {
        address,
        topics,
        data: abi::encode(&types, &data)?,
        ..Default::default()
    })
}

/// Places a log at a position on chain.
pub fn mined(log: Log, block_number: u64, log_index: u64) -> Log {
    Log {
        block_number: Some(block_number),
        block_hash: Some(H256::from_low_u64_be(block_number)),
        log_index: Some(log_index),
        ..log
    }
}

/// The sending half of a mocked log subscription.
#[derive(Clone, Debug)]
pub struct LogFeed {
    sender: mpsc::UnboundedSender<Result<Log, TransportError>>,
    unsubscribed: Arc<AtomicBool>,
}

/// Creates a log subscription together with the feed that drives it.
pub fn log_feed() -> (LogFeed, LogSubscription) {
    let (sender, receiver) = mpsc::unbounded();
    let unsubscribed = Arc::new(AtomicBool::new(false));
    let subscription = LogSubscription {
        stream: receiver.boxed(),
        unsubscribe: Some({
            let unsubscribed = unsubscribed.clone();
            async move { unsubscribed.store(true, Ordering::SeqCst) }.boxed()
        }),
    };
    (
        LogFeed {
            sender,
            unsubscribed,
        },
        subscription,
    )
}

impl LogFeed {
    /// Delivers a log. Returns `false` if the subscription is gone.
    pub fn push(&self, log: Log) -> bool {
        self.sender.unbounded_send(Ok(log)).is_ok()
    }

    /// Delivers a transport failure.
    pub fn fail(&self, err: TransportError) -> bool {
        self.sender.unbounded_send(Err(err)).is_ok()
    }

    /// Ends the log stream.
    pub fn close(&self) {
        self.sender.close_channel();
    }

    /// Whether the subscription was torn down on the node side.
    pub fn is_unsubscribed(&self) -> bool {
        self.unsubscribed.load(Ordering::SeqCst)
    }
}

/// Derives a stable address from a name, for readable tests.
pub fn address_for(name: &str) -> Address {
    Address::from_slice(&hash::keccak256(name)[12..])
}
