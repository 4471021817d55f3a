//! Module with common error types.

use crate::hash::H32;
use crate::U256;
use serde_json::Error as JsonError;
use std::fmt::{self, Display, Formatter};
use std::io::Error as IoError;
use thiserror::Error;

/// An error representing an error parsing a parameter type.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("'{0}' is not a valid Solidity type")]
pub struct ParseParamTypeError(pub String);

/// An error building an ABI model from its JSON description.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The ABI text is not valid JSON or does not have the expected shape.
    #[error("invalid ABI JSON: {0}")]
    Json(#[from] JsonError),

    /// The document is neither an array of entries nor an object with an
    /// `abi` field.
    #[error("ABI document must be an array of entries or an object with an `abi` field")]
    InvalidDocument,

    /// An ABI entry has a `type` that is not recognized.
    #[error("unknown ABI entry type `{0}`")]
    UnknownEntry(String),

    /// A parameter has a malformed type expression.
    #[error("invalid type for parameter `{param}` of `{entry}`: {source}")]
    ParamType {
        /// The ABI entry containing the parameter.
        entry: String,
        /// The parameter name.
        param: String,
        /// The underlying type parsing error.
        #[source]
        source: ParseParamTypeError,
    },

    /// Two functions or two errors of the same ABI share a selector.
    #[error("{kind}s `{first}` and `{second}` share selector 0x{}", hex::encode(.selector))]
    DuplicateSelector {
        /// Either "function" or "error".
        kind: &'static str,
        /// The signature of the first entry.
        first: String,
        /// The signature of the conflicting entry.
        second: String,
        /// The shared selector.
        selector: H32,
    },

    /// An event declares more indexed parameters than there are topics.
    #[error("event `{event}` has {count} indexed parameters but at most {max} are allowed")]
    TooManyIndexed {
        /// The event signature.
        event: String,
        /// The number of indexed parameters.
        count: usize,
        /// The maximum number of indexed parameters for this event.
        max: usize,
    },
}

/// An error in loading or parsing a contract artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// An IO error occurred when loading an artifact from disk.
    #[error("failed to open contract artifact file: {0}")]
    Io(#[from] IoError),

    /// A JSON error occurred while parsing an artifact.
    #[error("failed to parse contract artifact JSON: {0}")]
    Json(#[from] JsonError),

    /// The artifact's ABI is invalid.
    #[error("invalid contract ABI: {0}")]
    Abi(#[from] ParseError),
}

/// An error encoding a set of tokens against ABI parameter types.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EncodeError {
    /// A token has a different kind than its ABI type.
    #[error("type mismatch at {path}: expected {expected} but got {found}")]
    TypeMismatch {
        /// The path of the offending value.
        path: String,
        /// The expected ABI type.
        expected: String,
        /// The kind of the supplied token.
        found: String,
    },

    /// An integer does not fit in the width of its ABI type.
    #[error("value at {path} is out of range for {kind}")]
    OutOfRange {
        /// The path of the offending value.
        path: String,
        /// The integer ABI type.
        kind: String,
    },

    /// The number of values does not match the expected number of elements
    /// for a fixed array, a fixed byte array, a tuple or the parameter list.
    #[error("length mismatch at {path}: expected {expected} but got {actual}")]
    LengthMismatch {
        /// The path of the offending value.
        path: String,
        /// The expected length.
        expected: usize,
        /// The actual length.
        actual: usize,
    },
}

/// An error decoding ABI encoded data.
///
/// The error carries a hint of which value failed to decode and at which
/// byte offset of the input.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("failed to decode {path} at byte offset {offset}: {kind}")]
pub struct DecodeError {
    /// The path of the value that failed to decode.
    pub path: String,
    /// The byte offset in the input where the error was detected.
    pub offset: usize,
    /// The kind of failure.
    pub kind: DecodeErrorKind,
}

impl DecodeError {
    /// Creates a new decode error.
    pub fn new(path: impl Display, offset: usize, kind: DecodeErrorKind) -> Self {
        DecodeError {
            path: path.to_string(),
            offset,
            kind,
        }
    }
}

/// The kind of failure encountered while decoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DecodeErrorKind {
    /// The input ended before the value was complete.
    Truncated {
        /// The number of bytes needed.
        needed: usize,
        /// The number of bytes available.
        available: usize,
    },
    /// A dynamic offset points outside of the input.
    OffsetOutOfBounds(U256),
    /// A length prefix is inconsistent with the remaining input.
    InvalidLength(U256),
    /// A boolean word is neither 0 nor 1.
    InvalidBool,
    /// Padding bytes of a narrow value are not zero or sign extended.
    InvalidPadding,
    /// A log's topic 0 does not match the event signature.
    TopicMismatch,
    /// A log has a different number of topics than the event expects.
    TopicCount {
        /// The expected number of topics.
        expected: usize,
        /// The number of topics in the log.
        actual: usize,
    },
}

impl Display for DecodeErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DecodeErrorKind::Truncated { needed, available } => write!(
                f,
                "input truncated, needed {} bytes but only {} available",
                needed, available
            ),
            DecodeErrorKind::OffsetOutOfBounds(offset) => {
                write!(f, "offset {} is out of bounds", offset)
            }
            DecodeErrorKind::InvalidLength(length) => {
                write!(f, "length {} is inconsistent with the input", length)
            }
            DecodeErrorKind::InvalidBool => f.write_str("invalid boolean value"),
            DecodeErrorKind::InvalidPadding => f.write_str("invalid padding"),
            DecodeErrorKind::TopicMismatch => f.write_str("log topic does not match event"),
            DecodeErrorKind::TopicCount { expected, actual } => write!(
                f,
                "expected {} log topics but got {}",
                expected, actual
            ),
        }
    }
}
