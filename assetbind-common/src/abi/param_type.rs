//! Solidity parameter types and their canonical textual form.

use crate::errors::ParseParamTypeError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A Solidity parameter type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum ParamType {
    /// A 20-byte address.
    Address,
    /// Variable length bytes.
    Bytes,
    /// Signed integer of the given bit width.
    Int(usize),
    /// Unsigned integer of the given bit width.
    Uint(usize),
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Dynamically sized array.
    Array(Box<ParamType>),
    /// Fixed length bytes.
    FixedBytes(usize),
    /// Fixed length array.
    FixedArray(Box<ParamType>, usize),
    /// A tuple of heterogeneous components.
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// Returns `true` if the type is encoded in the tail of its enclosing
    /// sequence and referenced from the head with an offset.
    pub fn is_dynamic(&self) -> bool {
        match self {
            ParamType::Bytes | ParamType::String | ParamType::Array(_) => true,
            ParamType::FixedArray(inner, _) => inner.is_dynamic(),
            ParamType::Tuple(components) => components.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }

    /// Returns `true` for value types, which are stored directly in an event
    /// topic when indexed. Reference types are hashed instead.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            ParamType::Address
                | ParamType::Int(_)
                | ParamType::Uint(_)
                | ParamType::Bool
                | ParamType::FixedBytes(_)
        )
    }

    /// The number of bytes the type occupies in the head of its enclosing
    /// sequence.
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return 32;
        }
        match self {
            ParamType::FixedArray(inner, len) => inner.head_size() * len,
            ParamType::Tuple(components) => components.iter().map(ParamType::head_size).sum(),
            _ => 32,
        }
    }
}

impl Display for ParamType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ParamType::Address => f.write_str("address"),
            ParamType::Bytes => f.write_str("bytes"),
            ParamType::Int(n) => write!(f, "int{}", n),
            ParamType::Uint(n) => write!(f, "uint{}", n),
            ParamType::Bool => f.write_str("bool"),
            ParamType::String => f.write_str("string"),
            ParamType::Array(inner) => write!(f, "{}[]", inner),
            ParamType::FixedBytes(n) => write!(f, "bytes{}", n),
            ParamType::FixedArray(inner, n) => write!(f, "{}[{}]", inner, n),
            ParamType::Tuple(components) => {
                f.write_str("(")?;
                for (i, component) in components.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", component)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for ParamType {
    type Err = ParseParamTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseParamTypeError(s.to_owned());
        let s = s.trim();

        if let Some(prefix) = s.strip_suffix(']') {
            let open = prefix.rfind('[').ok_or_else(err)?;
            let inner = prefix[..open].parse::<ParamType>().map_err(|_| err())?;
            let dimension = &prefix[open + 1..];
            return if dimension.is_empty() {
                Ok(ParamType::Array(Box::new(inner)))
            } else {
                let len = dimension.parse::<usize>().map_err(|_| err())?;
                Ok(ParamType::FixedArray(Box::new(inner), len))
            };
        }

        if let Some(body) = s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
            return split_components(body)
                .ok_or_else(err)?
                .into_iter()
                .map(|component| component.parse::<ParamType>().map_err(|_| err()))
                .collect::<Result<Vec<_>, _>>()
                .map(ParamType::Tuple);
        }

        let kind = match s {
            "address" => ParamType::Address,
            "bool" => ParamType::Bool,
            "string" => ParamType::String,
            "bytes" => ParamType::Bytes,
            "uint" => ParamType::Uint(256),
            "int" => ParamType::Int(256),
            // external function pointers are an address followed by a selector
            "function" => ParamType::FixedBytes(24),
            _ => {
                if let Some(width) = s.strip_prefix("uint") {
                    ParamType::Uint(parse_int_width(width).ok_or_else(err)?)
                } else if let Some(width) = s.strip_prefix("int") {
                    ParamType::Int(parse_int_width(width).ok_or_else(err)?)
                } else if let Some(len) = s.strip_prefix("bytes") {
                    match len.parse::<usize>() {
                        Ok(len) if (1..=32).contains(&len) => ParamType::FixedBytes(len),
                        _ => return Err(err()),
                    }
                } else {
                    return Err(err());
                }
            }
        };
        Ok(kind)
    }
}

fn parse_int_width(width: &str) -> Option<usize> {
    match width.parse::<usize>() {
        Ok(width) if width > 0 && width <= 256 && width % 8 == 0 => Some(width),
        _ => None,
    }
}

/// Splits a tuple body on its top-level commas. Returns `None` on unbalanced
/// parentheses.
fn split_components(body: &str) -> Option<Vec<&str>> {
    if body.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut components = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                components.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    components.push(&body[start..]);
    Some(components)
}
