//! The transport façade used by bound contracts.
//!
//! A contract instance never talks to a node directly. It holds up to three
//! capabilities, one per facet of a binding: a [`ContractCaller`] for
//! read-only calls, a [`ContractTransactor`] for submitting transactions and
//! a [`ContractFilterer`] for querying and subscribing to logs. Anything that
//! implements all three is a [`Transport`]. [`Web3Transport`] implements them
//! on top of any `web3` transport.

mod rpc;

pub use self::rpc::Web3Transport;
use assetbind_common::abi::{RawLog, TopicFilter};
use assetbind_common::{Address, TransactionHash, H256, U256};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use jsonrpc_core::Error as JsonrpcError;
use std::cmp::Ordering;
use std::fmt::{self, Debug, Formatter};
use thiserror::Error;
use web3::error::Error as Web3Error;
pub use web3::types::{BlockId, BlockNumber};

/// An error reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The node answered with a JSON RPC error.
    #[error("JSON RPC error: {0}")]
    Rpc(JsonrpcError),

    /// The underlying `web3` transport failed.
    #[error("web3 error: {0}")]
    Web3(Web3Error),

    /// A node response could not be parsed.
    #[error("invalid node response: {0}")]
    Json(#[from] serde_json::Error),

    /// A transaction was submitted without a sender and the transport has no
    /// default account to use.
    #[error("transaction has no sender")]
    MissingSender,

    /// The transport was shut down.
    #[error("transport closed")]
    Closed,

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl From<Web3Error> for TransportError {
    fn from(err: Web3Error) -> Self {
        match err {
            Web3Error::Rpc(err) => TransportError::Rpc(err),
            err => TransportError::Web3(err),
        }
    }
}

/// A read-only call.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CallRequest {
    /// The account the call is made from.
    pub from: Option<Address>,
    /// The contract being called.
    pub to: Address,
    /// The call data: selector followed by encoded arguments.
    pub data: Vec<u8>,
}

/// The result of a read-only call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CallOutcome {
    /// The call succeeded with the given return data.
    Return(Vec<u8>),
    /// The call reverted with the given payload.
    Revert(Vec<u8>),
}

/// A state changing transaction to submit.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TransactionRequest {
    /// The sender. Transports may fall back to a default account.
    pub from: Option<Address>,
    /// The recipient contract.
    pub to: Address,
    /// The gas limit.
    pub gas: Option<U256>,
    /// The gas price.
    pub gas_price: Option<U256>,
    /// The value in wei sent with the transaction.
    pub value: Option<U256>,
    /// The sender nonce.
    pub nonce: Option<U256>,
    /// The call data. Empty for plain transfers.
    pub data: Vec<u8>,
}

/// A handle to a submitted transaction.
///
/// Submission does not wait for inclusion; the handle only identifies the
/// transaction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct TransactionHandle {
    /// The transaction hash.
    pub hash: TransactionHash,
}

impl From<TransactionHash> for TransactionHandle {
    fn from(hash: TransactionHash) -> Self {
        TransactionHandle { hash }
    }
}

/// A query for logs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogFilter {
    /// The emitting contract.
    pub address: Address,
    /// Filters on the topic slots.
    pub topics: TopicFilter,
    /// The first block to include. Defaults to the latest block.
    pub from_block: Option<BlockNumber>,
    /// The last block to include. Defaults to the latest block.
    pub to_block: Option<BlockNumber>,
    /// Limit on the number of logs. This is non-standard and not every node
    /// honours it.
    pub limit: Option<usize>,
}

/// A log emitted by a contract together with its position on chain.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Log {
    /// The emitting contract.
    pub address: Address,
    /// The log topics.
    pub topics: Vec<H256>,
    /// The non-indexed data.
    pub data: Vec<u8>,
    /// The containing block hash, `None` while pending.
    pub block_hash: Option<H256>,
    /// The containing block number, `None` while pending.
    pub block_number: Option<u64>,
    /// The emitting transaction hash.
    pub transaction_hash: Option<TransactionHash>,
    /// The index of the emitting transaction in its block.
    pub transaction_index: Option<u64>,
    /// The index of the log in its block.
    pub log_index: Option<u64>,
    /// Whether the log was retracted by a chain reorganization.
    pub removed: bool,
}

impl Log {
    /// The on-chain position of the log, `None` while pending.
    pub fn position(&self) -> Option<(u64, u64)> {
        Some((self.block_number?, self.log_index?))
    }

    /// Compares on-chain positions. Pending logs are not comparable.
    pub fn cmp_position(&self, other: &Log) -> Option<Ordering> {
        Some(self.position()?.cmp(&other.position()?))
    }

    /// The topics and data of the log.
    pub fn to_raw(&self) -> RawLog {
        RawLog {
            topics: self.topics.clone(),
            data: self.data.clone(),
        }
    }
}

/// A live log subscription.
///
/// Errors are delivered in-band on the stream. Dropping the stream stops
/// consuming logs; awaiting `unsubscribe` also tears the subscription down
/// on the node.
pub struct LogSubscription {
    /// The stream of logs.
    pub stream: BoxStream<'static, Result<Log, TransportError>>,
    /// Tears down the subscription on the transport side.
    pub unsubscribe: Option<BoxFuture<'static, ()>>,
}

impl LogSubscription {
    /// Creates a subscription from a stream without a teardown step.
    pub fn from_stream(stream: BoxStream<'static, Result<Log, TransportError>>) -> Self {
        LogSubscription {
            stream,
            unsubscribe: None,
        }
    }
}

impl Debug for LogSubscription {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("LogSubscription")
            .field("stream", &"BoxStream")
            .field("unsubscribe", &self.unsubscribe.is_some())
            .finish()
    }
}

/// Executes read-only calls.
pub trait ContractCaller: Debug + Send + Sync {
    /// Executes a call against the state at `block`.
    fn call(
        &self,
        request: CallRequest,
        block: BlockId,
    ) -> BoxFuture<'static, Result<CallOutcome, TransportError>>;
}

/// Submits transactions.
pub trait ContractTransactor: Debug + Send + Sync {
    /// Submits a transaction, returning once the transport accepted it.
    fn submit(
        &self,
        request: TransactionRequest,
    ) -> BoxFuture<'static, Result<TransactionHandle, TransportError>>;
}

/// Queries and subscribes to logs.
pub trait ContractFilterer: Debug + Send + Sync {
    /// Returns the historical logs matching the filter, in chain order.
    fn filter_logs(&self, filter: LogFilter) -> BoxStream<'static, Result<Log, TransportError>>;

    /// Subscribes to new logs matching the filter.
    fn subscribe_logs(
        &self,
        filter: LogFilter,
    ) -> BoxFuture<'static, Result<LogSubscription, TransportError>>;
}

/// A transport with all three capabilities.
pub trait Transport: ContractCaller + ContractTransactor + ContractFilterer {}

impl<T> Transport for T where T: ContractCaller + ContractTransactor + ContractFilterer {}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_at(block: Option<u64>, index: Option<u64>) -> Log {
        Log {
            block_number: block,
            log_index: index,
            ..Default::default()
        }
    }

    #[test]
    fn log_positions() {
        assert_eq!(
            log_at(Some(10), Some(2)).cmp_position(&log_at(Some(11), Some(0))),
            Some(Ordering::Less)
        );
        assert_eq!(
            log_at(Some(10), Some(2)).cmp_position(&log_at(Some(10), Some(0))),
            Some(Ordering::Greater)
        );
        assert_eq!(log_at(None, None).cmp_position(&log_at(Some(1), Some(0))), None);
    }

    #[test]
    fn web3_rpc_errors_are_unwrapped() {
        let err = TransportError::from(Web3Error::Rpc(JsonrpcError::internal_error()));
        assert!(matches!(err, TransportError::Rpc(_)));
        let err = TransportError::from(Web3Error::Unreachable);
        assert!(matches!(err, TransportError::Web3(_)));
    }
}
