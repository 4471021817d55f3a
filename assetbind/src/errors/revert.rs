//! Revert payloads and their resolution to typed errors.

use assetbind_common::abi::{self, AbiError, ParamType, Token};
use assetbind_common::hash::H32;
use assetbind_common::{Abi, U256};
use std::fmt::{self, Display, Formatter};

/// The selector of the built-in `Error(string)`.
pub const ERROR_SELECTOR: H32 = [0x08, 0xc3, 0x79, 0xa0];

/// The selector of the built-in `Panic(uint256)`.
pub const PANIC_SELECTOR: H32 = [0x4e, 0x48, 0x7b, 0x71];

/// The raw data a contract reverted with.
///
/// Resolution to a typed error is a separate step so that callers that only
/// log failures never pay for it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Revert {
    data: Vec<u8>,
}

impl Revert {
    /// Wraps raw revert data.
    pub fn new(data: Vec<u8>) -> Self {
        Revert { data }
    }

    /// The raw revert data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the revert, returning the raw data.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// The 4-byte error selector, if the payload has one.
    pub fn selector(&self) -> Option<H32> {
        let mut selector = H32::default();
        selector.copy_from_slice(self.data.get(..4)?);
        Some(selector)
    }

    /// The encoded error arguments following the selector.
    pub fn arguments(&self) -> &[u8] {
        self.data.get(4..).unwrap_or_default()
    }

    /// The message of an `Error(string)` revert.
    pub fn reason(&self) -> Option<String> {
        if self.selector()? != ERROR_SELECTOR {
            return None;
        }
        match abi::decode(&[ParamType::String], self.arguments()).ok()?.pop()? {
            Token::String(reason) => Some(reason),
            _ => None,
        }
    }

    /// The code of a `Panic(uint256)` revert.
    pub fn panic_code(&self) -> Option<U256> {
        if self.selector()? != PANIC_SELECTOR {
            return None;
        }
        abi::decode(&[ParamType::Uint(256)], self.arguments())
            .ok()?
            .pop()?
            .into_uint()
    }

    /// Finds the custom error of `abi` with a matching selector and decodes
    /// its arguments.
    pub fn resolve<'a>(&self, abi: &'a Abi) -> Option<(&'a AbiError, Vec<Token>)> {
        let error = abi.find_error_by_selector(&self.selector()?)?;
        let tokens = error.decode(self.arguments()).ok()?;
        Some((error, tokens))
    }

    /// Resolves the revert to a typed custom error, a built-in error or
    /// leaves it unknown.
    pub fn decode<E: ContractRevert>(&self) -> RevertReason<E> {
        if let Some(custom) = E::decode_revert(self) {
            RevertReason::Custom(custom)
        } else if let Some(reason) = self.reason() {
            RevertReason::Error(reason)
        } else if let Some(code) = self.panic_code() {
            RevertReason::Panic(code)
        } else {
            RevertReason::Unknown(self.clone())
        }
    }
}

impl Display for Revert {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if let Some(reason) = self.reason() {
            write!(f, "'{}'", reason)
        } else if self.data.is_empty() {
            f.write_str("no data")
        } else {
            write!(f, "0x{}", hex::encode(&self.data))
        }
    }
}

/// A typed custom error that can be recognized from revert data.
pub trait ContractRevert: Sized {
    /// Decodes the revert if its selector belongs to this type. Returns
    /// `None` for any other payload.
    fn decode_revert(revert: &Revert) -> Option<Self>;
}

/// Bindings without custom errors resolve nothing.
impl ContractRevert for () {
    fn decode_revert(_: &Revert) -> Option<Self> {
        None
    }
}

/// The result of resolving a revert.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RevertReason<E> {
    /// A custom error of the contract.
    Custom(E),
    /// A built-in `Error(string)`.
    Error(String),
    /// A built-in `Panic(uint256)`.
    Panic(U256),
    /// Revert data that matches nothing known.
    Unknown(Revert),
}

/// Encodes an `Error(string)` revert payload.
pub fn encode_reason(reason: &str) -> Vec<u8> {
    let mut data = ERROR_SELECTOR.to_vec();
    // A single string token always matches its type.
    if let Ok(encoded) = abi::encode(&[ParamType::String], &[Token::String(reason.to_owned())]) {
        data.extend_from_slice(&encoded);
    }
    data
}
