//! Decoding of head-tail encoded ABI values.
//!
//! Each sequence is decoded in two passes: a length pass that checks the
//! static head of the sequence is fully present, then a body pass that reads
//! the head and follows the offsets of dynamic values into the tail.

use crate::abi::encode::{fits_signed, fits_unsigned};
use crate::abi::path::ValuePath;
use crate::abi::{ParamType, Token};
use crate::errors::{DecodeError, DecodeErrorKind};
use crate::{Address, U256};

/// Decodes ABI encoded data according to the given types.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, DecodeError> {
    let types = types.iter().collect::<Vec<_>>();
    decode_params(&types, &[], data)
}

/// Decodes ABI encoded data according to the given types, using `names` to
/// describe failing parameters in errors.
pub(crate) fn decode_params(
    types: &[&ParamType],
    names: &[&str],
    data: &[u8],
) -> Result<Vec<Token>, DecodeError> {
    let path_of = |i: usize| ValuePath::Param(i, names.get(i).copied().unwrap_or(""));

    let mut end = 0;
    for (i, kind) in types.iter().enumerate() {
        let start = end;
        end += kind.head_size();
        if end > data.len() {
            return Err(DecodeError::new(
                path_of(i),
                start,
                DecodeErrorKind::Truncated {
                    needed: types.iter().map(|kind| kind.head_size()).sum(),
                    available: data.len(),
                },
            ));
        }
    }

    decode_sequence(types, data, 0, &path_of)
}

fn decode_sequence<'p>(
    types: &[&ParamType],
    data: &[u8],
    base: usize,
    path_of: &dyn Fn(usize) -> ValuePath<'p>,
) -> Result<Vec<Token>, DecodeError> {
    let mut tokens = Vec::with_capacity(types.len());
    let mut cursor = base;

    for (i, kind) in types.iter().enumerate() {
        let path = path_of(i);
        let token = if kind.is_dynamic() {
            let offset = U256::from_big_endian(&read_word(data, cursor, &path)?);
            let start = offset_within(data, base, offset)
                .ok_or_else(|| error(&path, cursor, DecodeErrorKind::OffsetOutOfBounds(offset)))?;
            decode_value(kind, data, start, &path)?
        } else {
            decode_value(kind, data, cursor, &path)?
        };
        cursor += kind.head_size();
        tokens.push(token);
    }

    Ok(tokens)
}

fn decode_value(
    kind: &ParamType,
    data: &[u8],
    at: usize,
    path: &ValuePath,
) -> Result<Token, DecodeError> {
    let token = match kind {
        ParamType::Address => {
            let word = read_word(data, at, path)?;
            if word[..12].iter().any(|byte| *byte != 0) {
                return Err(error(path, at, DecodeErrorKind::InvalidPadding));
            }
            Token::Address(Address::from_slice(&word[12..]))
        }
        ParamType::Uint(width) => {
            let value = U256::from_big_endian(&read_word(data, at, path)?);
            if !fits_unsigned(&value, *width) {
                return Err(error(path, at, DecodeErrorKind::InvalidPadding));
            }
            Token::Uint(value)
        }
        ParamType::Int(width) => {
            let value = U256::from_big_endian(&read_word(data, at, path)?);
            if !fits_signed(&value, *width) {
                return Err(error(path, at, DecodeErrorKind::InvalidPadding));
            }
            Token::Int(value)
        }
        ParamType::Bool => {
            let value = U256::from_big_endian(&read_word(data, at, path)?);
            if value.is_zero() {
                Token::Bool(false)
            } else if value == U256::one() {
                Token::Bool(true)
            } else {
                return Err(error(path, at, DecodeErrorKind::InvalidBool));
            }
        }
        ParamType::FixedBytes(len) => {
            let word = read_word(data, at, path)?;
            Token::FixedBytes(word[..*len].to_vec())
        }
        ParamType::Bytes => Token::Bytes(read_bytes(data, at, path)?.to_vec()),
        ParamType::String => {
            Token::String(String::from_utf8_lossy(read_bytes(data, at, path)?).into_owned())
        }
        ParamType::Array(inner) => {
            let len = read_len(data, at, path, inner.head_size())?;
            let types = vec![inner.as_ref(); len];
            Token::Array(decode_sequence(
                &types,
                data,
                at + 32,
                &|i| ValuePath::Element(path, i),
            )?)
        }
        ParamType::FixedArray(inner, len) => {
            check_head(data, at, inner.head_size() * len, path)?;
            let types = vec![inner.as_ref(); *len];
            Token::FixedArray(decode_sequence(&types, data, at, &|i| {
                ValuePath::Element(path, i)
            })?)
        }
        ParamType::Tuple(components) => {
            check_head(data, at, components.iter().map(ParamType::head_size).sum(), path)?;
            let types = components.iter().collect::<Vec<_>>();
            Token::Tuple(decode_sequence(&types, data, at, &|i| {
                ValuePath::Component(path, i)
            })?)
        }
    };
    Ok(token)
}

fn error(path: &ValuePath, offset: usize, kind: DecodeErrorKind) -> DecodeError {
    DecodeError::new(path, offset, kind)
}

fn read_word(data: &[u8], at: usize, path: &ValuePath) -> Result<[u8; 32], DecodeError> {
    let word = data.get(at..at + 32).ok_or_else(|| {
        error(
            path,
            at,
            DecodeErrorKind::Truncated {
                needed: at + 32,
                available: data.len(),
            },
        )
    })?;
    let mut result = [0u8; 32];
    result.copy_from_slice(word);
    Ok(result)
}

fn check_head(data: &[u8], at: usize, size: usize, path: &ValuePath) -> Result<(), DecodeError> {
    if at + size > data.len() {
        return Err(error(
            path,
            at,
            DecodeErrorKind::Truncated {
                needed: at + size,
                available: data.len(),
            },
        ));
    }
    Ok(())
}

/// Reads a length prefix and checks that `len` elements of `element_size`
/// bytes each fit in the remaining input.
fn read_len(
    data: &[u8],
    at: usize,
    path: &ValuePath,
    element_size: usize,
) -> Result<usize, DecodeError> {
    let len = U256::from_big_endian(&read_word(data, at, path)?);
    let remaining = data.len() - (at + 32);
    let fits = len <= U256::from(remaining)
        && len
            .as_usize()
            .checked_mul(element_size)
            .map_or(false, |size| size <= remaining);
    if !fits {
        return Err(error(path, at, DecodeErrorKind::InvalidLength(len)));
    }
    Ok(len.as_usize())
}

fn read_bytes<'d>(data: &'d [u8], at: usize, path: &ValuePath) -> Result<&'d [u8], DecodeError> {
    let len = read_len(data, at, path, 1)?;
    Ok(&data[at + 32..at + 32 + len])
}

fn offset_within(data: &[u8], base: usize, offset: U256) -> Option<usize> {
    if offset > U256::from(data.len()) {
        return None;
    }
    let start = base.checked_add(offset.as_usize())?;
    (start <= data.len()).then_some(start)
}
