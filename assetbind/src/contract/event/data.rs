//! Module contains code for decoding and manipulating event data.

use crate::errors::ExecutionError;
use crate::transport::Log;
use assetbind_common::abi::{Event as AbiEvent, Token};
use std::sync::Arc;

/// A typed event that can be decoded from a log of its ABI event.
///
/// Generated event structs implement this by decoding the log parameters and
/// keeping the log itself for provenance.
pub trait DecodeLog: Sized + 'static {
    /// Decodes a log that was matched against `event`.
    fn decode_log(event: &AbiEvent, log: Log) -> Result<Self, ExecutionError>;
}

impl DecodeLog for Vec<Token> {
    fn decode_log(event: &AbiEvent, log: Log) -> Result<Self, ExecutionError> {
        Ok(event.parse_log(&log.to_raw())?)
    }
}

impl DecodeLog for Log {
    fn decode_log(event: &AbiEvent, log: Log) -> Result<Self, ExecutionError> {
        event.parse_log(&log.to_raw())?;
        Ok(log)
    }
}

/// A type that can be decoded from any log of a contract, dispatching on
/// the log's topics. The generated `events::Event` enum implements this.
pub trait ParseLog: Sized + 'static {
    /// Decodes a contract log.
    fn parse_log(log: Log) -> Result<Self, ExecutionError>;
}

/// A type representing a contract event that was either added or removed. Note
/// that this type intentionally an enum so that the handling of removed events
/// is made more explicit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EventStatus<T> {
    /// A new event was received.
    Added(T),
    /// A previously mined event was removed as a result of a re-org.
    Removed(T),
}

impl<T> EventStatus<T> {
    /// Get a reference the underlying event data regardless of whether the
    /// event was added or removed.
    pub fn inner_data(&self) -> &T {
        match self {
            EventStatus::Added(value) => value,
            EventStatus::Removed(value) => value,
        }
    }

    /// Unwraps the event data regardless of whether the event was added or
    /// removed.
    pub fn into_inner(self) -> T {
        match self {
            EventStatus::Added(value) | EventStatus::Removed(value) => value,
        }
    }

    /// Gets a bool representing if the event was added.
    pub fn is_added(&self) -> bool {
        matches!(self, EventStatus::Added(_))
    }

    /// Gets a bool representing if the event was removed.
    pub fn is_removed(&self) -> bool {
        matches!(self, EventStatus::Removed(_))
    }

    /// Get the underlying event data if the event was added, `None` otherwise.
    pub fn added(self) -> Option<T> {
        match self {
            EventStatus::Added(value) => Some(value),
            EventStatus::Removed(_) => None,
        }
    }

    /// Get the underlying event data if the event was removed, `None`
    /// otherwise.
    pub fn removed(self) -> Option<T> {
        match self {
            EventStatus::Removed(value) => Some(value),
            EventStatus::Added(_) => None,
        }
    }

    /// Maps the inner data of an event into some other data.
    pub fn map<U, F>(self, f: F) -> EventStatus<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            EventStatus::Added(inner) => EventStatus::Added(f(inner)),
            EventStatus::Removed(inner) => EventStatus::Removed(f(inner)),
        }
    }
}

/// Decodes logs into typed events, shared between iterators and
/// subscriptions.
pub(crate) struct LogDecoder<E> {
    signature: Arc<str>,
    decode: Arc<dyn Fn(Log) -> Result<E, ExecutionError> + Send + Sync>,
}

impl<E> LogDecoder<E> {
    /// A decoder for a single ABI event.
    pub fn for_event(event: AbiEvent) -> Self
    where
        E: DecodeLog,
    {
        LogDecoder {
            signature: event.abi_signature().into(),
            decode: Arc::new(move |log| E::decode_log(&event, log)),
        }
    }

    /// A decoder for any log of a contract.
    pub fn for_contract() -> Self
    where
        E: ParseLog,
    {
        LogDecoder {
            signature: "*".into(),
            decode: Arc::new(E::parse_log),
        }
    }

    /// The signature used to annotate errors.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Decodes a log, marking retracted logs as removed.
    pub fn decode(&self, log: Log) -> Result<EventStatus<E>, ExecutionError> {
        let removed = log.removed;
        let data = (self.decode)(log)?;
        Ok(if removed {
            EventStatus::Removed(data)
        } else {
            EventStatus::Added(data)
        })
    }
}

impl<E> Clone for LogDecoder<E> {
    fn clone(&self) -> Self {
        LogDecoder {
            signature: self.signature.clone(),
            decode: self.decode.clone(),
        }
    }
}

impl<E> std::fmt::Debug for LogDecoder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("LogDecoder")
            .field("signature", &self.signature)
            .finish()
    }
}
