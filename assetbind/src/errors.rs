//! Module with the runtime error types.

mod ganache;
mod geth;
mod hardhat;
mod nethermind;
pub(crate) mod revert;

pub use self::revert::{
    encode_reason, ContractRevert, Revert, RevertReason, ERROR_SELECTOR, PANIC_SELECTOR,
};
use crate::tokens::Error as TokenizeError;
use crate::transport::TransportError;
pub use assetbind_common::errors::*;
use assetbind_common::abi::{Event, Function};
use assetbind_common::hash::H32;
use jsonrpc_core::Error as JsonrpcError;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;
use uint::FromDecStrErr;

/// A capability an `Instance` may be bound with.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Capability {
    /// Read-only calls.
    Caller,
    /// Transaction submission.
    Transactor,
    /// Log queries and subscriptions.
    Filterer,
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Capability::Caller => "caller",
            Capability::Transactor => "transactor",
            Capability::Filterer => "filterer",
        })
    }
}

/// The class of an error, used to decide how to react to it without matching
/// on every variant.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The binding was used in a way its configuration does not support.
    Configuration,
    /// Arguments could not be encoded.
    Encoding,
    /// The node could not be reached or answered with an error.
    Transport,
    /// Returned data or a log could not be decoded.
    Decode,
    /// The contract reverted.
    ContractReverted,
    /// An error surfaced through an event iterator or subscription.
    Subscription,
}

/// Error that can occur while executing a contract call or transaction, or
/// while decoding its logs.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The instance was not bound with the capability the operation needs.
    #[error("contract instance has no {0} capability")]
    MissingCapability(Capability),

    /// No function with the given name exists in the ABI.
    #[error("contract has no method named `{0}`")]
    UnknownMethod(String),

    /// No event with the given name or topic exists in the ABI.
    #[error("contract has no event `{0}`")]
    UnknownEvent(String),

    /// No function with the given selector exists in the ABI.
    #[error("contract has no method with selector 0x{}", hex::encode(.0))]
    UnknownSelector(H32),

    /// A state changing function was called as a read-only call.
    #[error("method `{0}` is not a view method")]
    NotView(String),

    /// Arguments did not match the ABI types.
    #[error("encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Return data or log data did not match the ABI types.
    #[error("decoding error: {0}")]
    Decode(#[from] DecodeError),

    /// Decoded tokens did not match the Rust types of the binding.
    #[error("tokenization error: {0}")]
    Tokenize(#[from] TokenizeError),

    /// The transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The contract reverted. The payload is kept opaque; see
    /// [`Revert::decode`] and [`Revert::resolve`] for typed resolution.
    #[error("contract reverted: {0}")]
    ContractReverted(Revert),
}

impl ExecutionError {
    /// Returns the class of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutionError::MissingCapability(_)
            | ExecutionError::UnknownMethod(_)
            | ExecutionError::UnknownEvent(_)
            | ExecutionError::UnknownSelector(_)
            | ExecutionError::NotView(_) => ErrorKind::Configuration,
            ExecutionError::Encode(_) => ErrorKind::Encoding,
            // `into_token` is infallible, tokenization only fails on the way
            // back from the codec.
            ExecutionError::Decode(_) | ExecutionError::Tokenize(_) => ErrorKind::Decode,
            ExecutionError::Transport(_) => ErrorKind::Transport,
            ExecutionError::ContractReverted(_) => ErrorKind::ContractReverted,
        }
    }

    /// Returns the revert payload if the contract reverted.
    pub fn as_revert(&self) -> Option<&Revert> {
        match self {
            ExecutionError::ContractReverted(revert) => Some(revert),
            _ => None,
        }
    }
}

/// Error that can occur while calling a contract method, annotated with the
/// method's signature.
#[derive(Debug, Error)]
#[error("method '{signature}' failure: {inner}")]
pub struct MethodError {
    /// The signature of the failed method.
    pub signature: String,

    /// The inner execution error.
    #[source]
    pub inner: ExecutionError,
}

impl MethodError {
    /// Creates a new `MethodError` from an ABI function and an
    /// inner error.
    pub fn new<I: Into<ExecutionError>>(function: &Function, inner: I) -> Self {
        MethodError::from_parts(function.signature(), inner.into())
    }

    /// Creates a `MethodError` from its signature and inner error.
    pub fn from_parts(signature: String, inner: ExecutionError) -> Self {
        MethodError { signature, inner }
    }

    /// Returns the class of the inner error.
    pub fn kind(&self) -> ErrorKind {
        self.inner.kind()
    }
}

/// Error that can occur while filtering, streaming or decoding events,
/// annotated with the event's signature.
#[derive(Debug, Error)]
#[error("event '{signature}' failure: {inner}")]
pub struct EventError {
    /// The signature of the event.
    pub signature: String,

    /// The inner execution error.
    #[source]
    pub inner: ExecutionError,
}

impl EventError {
    /// Creates a new `EventError` from an ABI event and an
    /// inner error.
    pub fn new<I: Into<ExecutionError>>(event: &Event, inner: I) -> Self {
        EventError::from_parts(event.abi_signature(), inner.into())
    }

    /// Creates an `EventError` from its signature and inner error.
    pub fn from_parts(signature: String, inner: ExecutionError) -> Self {
        EventError { signature, inner }
    }

    /// Errors in the event pipeline are always of the subscription class.
    /// Use [`EventError::source_kind`] for the class of the underlying error.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Subscription
    }

    /// Returns the class of the underlying error.
    pub fn source_kind(&self) -> ErrorKind {
        self.inner.kind()
    }
}

/// Extracts the revert payload from a node's JSON RPC error, trying the
/// error formats of the common node implementations in turn. Returns `None`
/// when the error is not a revert.
pub fn revert_payload(err: &JsonrpcError) -> Option<Vec<u8>> {
    geth::revert_payload(err)
        .or_else(|| hardhat::revert_payload(err))
        .or_else(|| nethermind::revert_payload(err))
        .or_else(|| ganache::revert_payload(err))
}

/// Error parsing a signed 256-bit integer.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ParseI256Error {
    /// A character is not a digit of the radix.
    #[error("invalid digit found in string")]
    InvalidDigit,

    /// The number does not fit in 256 bits.
    #[error("number does not fit in 256-bit integer")]
    IntegerOverflow,
}

impl From<FromDecStrErr> for ParseI256Error {
    fn from(err: FromDecStrErr) -> Self {
        match err {
            FromDecStrErr::InvalidCharacter => ParseI256Error::InvalidDigit,
            FromDecStrErr::InvalidLength => ParseI256Error::IntegerOverflow,
        }
    }
}

/// Error converting between integer types.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("output of range integer conversion attempted")]
pub struct TryFromBigIntError;
