//! Dynamically typed ABI values.

use crate::abi::ParamType;
use crate::{Address, U256};

/// An ABI value.
///
/// Signed integers are stored as the raw two's complement 256-bit word.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    /// An address.
    Address(Address),
    /// Fixed length bytes.
    FixedBytes(Vec<u8>),
    /// Variable length bytes.
    Bytes(Vec<u8>),
    /// A signed integer in two's complement.
    Int(U256),
    /// An unsigned integer.
    Uint(U256),
    /// A boolean.
    Bool(bool),
    /// A string.
    String(String),
    /// A fixed length array.
    FixedArray(Vec<Token>),
    /// A dynamically sized array.
    Array(Vec<Token>),
    /// A tuple.
    Tuple(Vec<Token>),
}

impl Token {
    /// A short description of the token kind, used in error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Token::Address(_) => "address".to_owned(),
            Token::FixedBytes(bytes) => format!("bytes{}", bytes.len()),
            Token::Bytes(_) => "bytes".to_owned(),
            Token::Int(_) => "int".to_owned(),
            Token::Uint(_) => "uint".to_owned(),
            Token::Bool(_) => "bool".to_owned(),
            Token::String(_) => "string".to_owned(),
            Token::FixedArray(items) => format!("array[{}]", items.len()),
            Token::Array(_) => "array[]".to_owned(),
            Token::Tuple(items) => format!("tuple of {}", items.len()),
        }
    }

    /// Checks whether the token structurally matches a parameter type,
    /// ignoring integer ranges.
    pub fn type_check(&self, kind: &ParamType) -> bool {
        match (self, kind) {
            (Token::Address(_), ParamType::Address)
            | (Token::Bytes(_), ParamType::Bytes)
            | (Token::Int(_), ParamType::Int(_))
            | (Token::Uint(_), ParamType::Uint(_))
            | (Token::Bool(_), ParamType::Bool)
            | (Token::String(_), ParamType::String) => true,
            (Token::FixedBytes(bytes), ParamType::FixedBytes(len)) => bytes.len() == *len,
            (Token::Array(items), ParamType::Array(inner)) => {
                items.iter().all(|item| item.type_check(inner))
            }
            (Token::FixedArray(items), ParamType::FixedArray(inner, len)) => {
                items.len() == *len && items.iter().all(|item| item.type_check(inner))
            }
            (Token::Tuple(items), ParamType::Tuple(components)) => {
                items.len() == components.len()
                    && items
                        .iter()
                        .zip(components)
                        .all(|(item, component)| item.type_check(component))
            }
            _ => false,
        }
    }

    /// Converts the token into an address.
    pub fn into_address(self) -> Option<Address> {
        match self {
            Token::Address(address) => Some(address),
            _ => None,
        }
    }

    /// Converts the token into fixed bytes.
    pub fn into_fixed_bytes(self) -> Option<Vec<u8>> {
        match self {
            Token::FixedBytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Converts the token into bytes.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Token::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Converts the token into a raw two's complement signed integer.
    pub fn into_int(self) -> Option<U256> {
        match self {
            Token::Int(value) => Some(value),
            _ => None,
        }
    }

    /// Converts the token into an unsigned integer.
    pub fn into_uint(self) -> Option<U256> {
        match self {
            Token::Uint(value) => Some(value),
            _ => None,
        }
    }

    /// Converts the token into a boolean.
    pub fn into_bool(self) -> Option<bool> {
        match self {
            Token::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Converts the token into a string.
    pub fn into_string(self) -> Option<String> {
        match self {
            Token::String(value) => Some(value),
            _ => None,
        }
    }

    /// Converts the token into the elements of a fixed array.
    pub fn into_fixed_array(self) -> Option<Vec<Token>> {
        match self {
            Token::FixedArray(items) => Some(items),
            _ => None,
        }
    }

    /// Converts the token into the elements of an array.
    pub fn into_array(self) -> Option<Vec<Token>> {
        match self {
            Token::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Converts the token into the components of a tuple.
    pub fn into_tuple(self) -> Option<Vec<Token>> {
        match self {
            Token::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_check_nested_values() {
        let kind = "(address,uint256[],bytes2)".parse::<ParamType>().unwrap();
        let token = Token::Tuple(vec![
            Token::Address(Address::zero()),
            Token::Array(vec![Token::Uint(1.into()), Token::Uint(2.into())]),
            Token::FixedBytes(vec![1, 2]),
        ]);
        assert!(token.type_check(&kind));

        let token = Token::Tuple(vec![
            Token::Address(Address::zero()),
            Token::Array(vec![Token::Bool(true)]),
            Token::FixedBytes(vec![1, 2]),
        ]);
        assert!(!token.type_check(&kind));
    }
}
