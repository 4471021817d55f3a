//! Head-tail encoding of ABI values.
//!
//! Every sequence (parameter list, tuple or array body) is laid out as a head
//! of fixed size followed by a tail. Static values are written in place in the
//! head; dynamic values are written to the tail and referenced from the head
//! with a byte offset relative to the start of the sequence. The layout is
//! produced in a single pass since head sizes are known from the types alone.

use crate::abi::path::ValuePath;
use crate::abi::{ParamType, Token};
use crate::errors::EncodeError;
use crate::hash::keccak256;
use crate::{H256, U256};

/// Encodes tokens according to the given types.
///
/// Integers are range checked against their width and every token must match
/// the kind of its type.
pub fn encode(types: &[ParamType], tokens: &[Token]) -> Result<Vec<u8>, EncodeError> {
    let types = types.iter().collect::<Vec<_>>();
    encode_params(&types, &[], tokens)
}

/// Encodes tokens according to the given types, using `names` to describe
/// failing parameters in errors.
pub(crate) fn encode_params(
    types: &[&ParamType],
    names: &[&str],
    tokens: &[Token],
) -> Result<Vec<u8>, EncodeError> {
    if types.len() != tokens.len() {
        return Err(EncodeError::LengthMismatch {
            path: "parameters".to_owned(),
            expected: types.len(),
            actual: tokens.len(),
        });
    }

    let mut out = Vec::with_capacity(types.iter().map(|kind| kind.head_size()).sum());
    encode_sequence(
        types,
        tokens,
        &|i| ValuePath::Param(i, names.get(i).copied().unwrap_or("")),
        &mut out,
    )?;
    Ok(out)
}

/// Computes the topic for an indexed event parameter.
///
/// Value types are stored as their 32-byte encoding. Strings and bytes are
/// hashed as their raw contents, and arrays and tuples are hashed as their
/// in-place encoding where every element is padded to 32 bytes.
pub fn encode_topic(kind: &ParamType, token: &Token, name: &str) -> Result<H256, EncodeError> {
    let path = ValuePath::Param(0, name);
    match (kind, token) {
        (ParamType::Bytes, Token::Bytes(bytes)) => Ok(H256(keccak256(bytes))),
        (ParamType::String, Token::String(value)) => Ok(H256(keccak256(value))),
        _ if kind.is_value_type() => {
            let mut word = Vec::with_capacity(32);
            encode_value(kind, token, &path, &mut word)?;
            Ok(H256::from_slice(&word))
        }
        _ => {
            let mut buffer = Vec::new();
            encode_in_place(kind, token, &path, &mut buffer)?;
            Ok(H256(keccak256(buffer)))
        }
    }
}

fn encode_sequence<'p>(
    types: &[&ParamType],
    tokens: &[Token],
    path_of: &dyn Fn(usize) -> ValuePath<'p>,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    let head_len = types.iter().map(|kind| kind.head_size()).sum::<usize>();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for (i, (kind, token)) in types.iter().zip(tokens).enumerate() {
        let path = path_of(i);
        if kind.is_dynamic() {
            head.extend_from_slice(&usize_word(head_len + tail.len()));
            encode_value(kind, token, &path, &mut tail)?;
        } else {
            encode_value(kind, token, &path, &mut head)?;
        }
    }

    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    Ok(())
}

fn encode_value(
    kind: &ParamType,
    token: &Token,
    path: &ValuePath,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    match (kind, token) {
        (ParamType::Address, Token::Address(address)) => {
            out.extend_from_slice(&[0u8; 12]);
            out.extend_from_slice(address.as_bytes());
        }
        (ParamType::Uint(width), Token::Uint(value)) => {
            if !fits_unsigned(value, *width) {
                return Err(out_of_range(kind, path));
            }
            out.extend_from_slice(&u256_word(value));
        }
        (ParamType::Int(width), Token::Int(value)) => {
            if !fits_signed(value, *width) {
                return Err(out_of_range(kind, path));
            }
            out.extend_from_slice(&u256_word(value));
        }
        (ParamType::Bool, Token::Bool(value)) => {
            out.extend_from_slice(&usize_word(*value as usize));
        }
        (ParamType::FixedBytes(len), Token::FixedBytes(bytes)) => {
            check_len(path, *len, bytes.len())?;
            out.extend_from_slice(bytes);
            pad_to_word(out, bytes.len());
        }
        (ParamType::Bytes, Token::Bytes(bytes)) => encode_bytes(bytes, out),
        (ParamType::String, Token::String(value)) => encode_bytes(value.as_bytes(), out),
        (ParamType::Array(inner), Token::Array(items)) => {
            out.extend_from_slice(&usize_word(items.len()));
            let types = vec![inner.as_ref(); items.len()];
            encode_sequence(&types, items, &|i| ValuePath::Element(path, i), out)?;
        }
        (ParamType::FixedArray(inner, len), Token::FixedArray(items)) => {
            check_len(path, *len, items.len())?;
            let types = vec![inner.as_ref(); items.len()];
            encode_sequence(&types, items, &|i| ValuePath::Element(path, i), out)?;
        }
        (ParamType::Tuple(components), Token::Tuple(items)) => {
            check_len(path, components.len(), items.len())?;
            let types = components.iter().collect::<Vec<_>>();
            encode_sequence(&types, items, &|i| ValuePath::Component(path, i), out)?;
        }
        _ => return Err(type_mismatch(kind, token, path)),
    }
    Ok(())
}

fn encode_in_place(
    kind: &ParamType,
    token: &Token,
    path: &ValuePath,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    match (kind, token) {
        (ParamType::Bytes, Token::Bytes(bytes)) => {
            out.extend_from_slice(bytes);
            pad_to_word(out, bytes.len());
        }
        (ParamType::String, Token::String(value)) => {
            out.extend_from_slice(value.as_bytes());
            pad_to_word(out, value.len());
        }
        (ParamType::Array(inner), Token::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                encode_in_place(inner, item, &ValuePath::Element(path, i), out)?;
            }
        }
        (ParamType::FixedArray(inner, len), Token::FixedArray(items)) => {
            check_len(path, *len, items.len())?;
            for (i, item) in items.iter().enumerate() {
                encode_in_place(inner, item, &ValuePath::Element(path, i), out)?;
            }
        }
        (ParamType::Tuple(components), Token::Tuple(items)) => {
            check_len(path, components.len(), items.len())?;
            for (i, (component, item)) in components.iter().zip(items).enumerate() {
                encode_in_place(component, item, &ValuePath::Component(path, i), out)?;
            }
        }
        _ if kind.is_value_type() => encode_value(kind, token, path, out)?,
        _ => return Err(type_mismatch(kind, token, path)),
    }
    Ok(())
}

fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    pad_to_word(out, bytes.len());
}

fn pad_to_word(out: &mut Vec<u8>, len: usize) {
    let padding = (32 - len % 32) % 32;
    out.resize(out.len() + padding, 0);
}

fn check_len(path: &ValuePath, expected: usize, actual: usize) -> Result<(), EncodeError> {
    if expected != actual {
        return Err(EncodeError::LengthMismatch {
            path: path.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

fn out_of_range(kind: &ParamType, path: &ValuePath) -> EncodeError {
    EncodeError::OutOfRange {
        path: path.to_string(),
        kind: kind.to_string(),
    }
}

fn type_mismatch(kind: &ParamType, token: &Token, path: &ValuePath) -> EncodeError {
    EncodeError::TypeMismatch {
        path: path.to_string(),
        expected: kind.to_string(),
        found: token.kind_name(),
    }
}

/// Returns `true` if the unsigned value fits in `width` bits.
pub(crate) fn fits_unsigned(value: &U256, width: usize) -> bool {
    width >= 256 || value.bits() <= width
}

/// Returns `true` if the two's complement value is a sign extension of its
/// low `width` bits.
pub(crate) fn fits_signed(value: &U256, width: usize) -> bool {
    if width >= 256 {
        return true;
    }
    if value.bit(255) {
        (!*value).bits() < width
    } else {
        value.bits() < width
    }
}

pub(crate) fn usize_word(value: usize) -> [u8; 32] {
    u256_word(&U256::from(value))
}

pub(crate) fn u256_word(value: &U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Address;
    use hex_literal::hex;

    fn words(hex_words: &[&str]) -> Vec<u8> {
        hex_words
            .iter()
            .flat_map(|word| hex::decode(word).unwrap())
            .collect()
    }

    #[test]
    fn encode_static_values() {
        // `baz(uint32,bool)` example from the Solidity ABI documentation
        let encoded = encode(
            &[ParamType::Uint(32), ParamType::Bool],
            &[Token::Uint(69.into()), Token::Bool(true)],
        )
        .unwrap();
        assert_eq!(
            encoded,
            words(&[
                "0000000000000000000000000000000000000000000000000000000000000045",
                "0000000000000000000000000000000000000000000000000000000000000001",
            ])
        );
    }

    #[test]
    fn encode_dynamic_values() {
        // `sam(bytes,bool,uint256[])` example from the Solidity ABI documentation
        let encoded = encode(
            &[
                ParamType::Bytes,
                ParamType::Bool,
                ParamType::Array(Box::new(ParamType::Uint(256))),
            ],
            &[
                Token::Bytes(b"dave".to_vec()),
                Token::Bool(true),
                Token::Array(vec![
                    Token::Uint(1.into()),
                    Token::Uint(2.into()),
                    Token::Uint(3.into()),
                ]),
            ],
        )
        .unwrap();
        assert_eq!(
            encoded,
            words(&[
                "0000000000000000000000000000000000000000000000000000000000000060",
                "0000000000000000000000000000000000000000000000000000000000000001",
                "00000000000000000000000000000000000000000000000000000000000000a0",
                "0000000000000000000000000000000000000000000000000000000000000004",
                "6461766500000000000000000000000000000000000000000000000000000000",
                "0000000000000000000000000000000000000000000000000000000000000003",
                "0000000000000000000000000000000000000000000000000000000000000001",
                "0000000000000000000000000000000000000000000000000000000000000002",
                "0000000000000000000000000000000000000000000000000000000000000003",
            ])
        );
    }

    #[test]
    fn encode_nested_dynamic_arrays() {
        // `g(uint256[][],string[])` example from the Solidity ABI documentation
        let encoded = encode(
            &[
                "uint256[][]".parse().unwrap(),
                "string[]".parse().unwrap(),
            ],
            &[
                Token::Array(vec![
                    Token::Array(vec![Token::Uint(1.into()), Token::Uint(2.into())]),
                    Token::Array(vec![Token::Uint(3.into())]),
                ]),
                Token::Array(vec![
                    Token::String("one".into()),
                    Token::String("two".into()),
                    Token::String("three".into()),
                ]),
            ],
        )
        .unwrap();
        assert_eq!(
            encoded,
            words(&[
                "0000000000000000000000000000000000000000000000000000000000000040",
                "0000000000000000000000000000000000000000000000000000000000000140",
                "0000000000000000000000000000000000000000000000000000000000000002",
                "0000000000000000000000000000000000000000000000000000000000000040",
                "00000000000000000000000000000000000000000000000000000000000000a0",
                "0000000000000000000000000000000000000000000000000000000000000002",
                "0000000000000000000000000000000000000000000000000000000000000001",
                "0000000000000000000000000000000000000000000000000000000000000002",
                "0000000000000000000000000000000000000000000000000000000000000001",
                "0000000000000000000000000000000000000000000000000000000000000003",
                "0000000000000000000000000000000000000000000000000000000000000003",
                "0000000000000000000000000000000000000000000000000000000000000060",
                "00000000000000000000000000000000000000000000000000000000000000a0",
                "00000000000000000000000000000000000000000000000000000000000000e0",
                "0000000000000000000000000000000000000000000000000000000000000003",
                "6f6e650000000000000000000000000000000000000000000000000000000000",
                "0000000000000000000000000000000000000000000000000000000000000003",
                "74776f0000000000000000000000000000000000000000000000000000000000",
                "0000000000000000000000000000000000000000000000000000000000000005",
                "7468726565000000000000000000000000000000000000000000000000000000",
            ])
        );
    }

    #[test]
    fn encode_negative_integers() {
        let encoded = encode(&[ParamType::Int(8)], &[Token::Int(U256::MAX)]).unwrap();
        assert_eq!(encoded, vec![0xff; 32]);
    }

    #[test]
    fn reject_out_of_range_integers() {
        assert_eq!(
            encode(&[ParamType::Uint(8)], &[Token::Uint(256.into())]),
            Err(EncodeError::OutOfRange {
                path: "#0".to_owned(),
                kind: "uint8".to_owned(),
            })
        );
        assert!(encode(&[ParamType::Uint(8)], &[Token::Uint(255.into())]).is_ok());

        // -129 does not fit in an int8, -128 does
        let minus = |value: u64| !U256::from(value - 1);
        assert!(encode(&[ParamType::Int(8)], &[Token::Int(minus(129))]).is_err());
        assert!(encode(&[ParamType::Int(8)], &[Token::Int(minus(128))]).is_ok());
        assert!(encode(&[ParamType::Int(8)], &[Token::Int(128.into())]).is_err());
    }

    #[test]
    fn reject_mismatched_shapes() {
        let err = encode(
            &["(address,bool)".parse().unwrap()],
            &[Token::Tuple(vec![Token::Address(Address::zero())])],
        )
        .unwrap_err();
        assert_eq!(
            err,
            EncodeError::LengthMismatch {
                path: "#0".to_owned(),
                expected: 2,
                actual: 1,
            }
        );

        let err = encode(
            &["uint256[2]".parse().unwrap()],
            &[Token::FixedArray(vec![Token::Bool(true), Token::Bool(false)])],
        )
        .unwrap_err();
        assert_eq!(
            err,
            EncodeError::TypeMismatch {
                path: "#0[0]".to_owned(),
                expected: "uint256".to_owned(),
                found: "bool".to_owned(),
            }
        );

        assert!(encode(&[ParamType::FixedBytes(4)], &[Token::FixedBytes(vec![1, 2])]).is_err());
        assert!(encode(&[ParamType::Bool], &[]).is_err());
    }

    #[test]
    fn topics_for_value_and_reference_types() {
        assert_eq!(
            encode_topic(
                &ParamType::Address,
                &Token::Address(Address::repeat_byte(0x11)),
                "from"
            )
            .unwrap(),
            H256(hex!(
                "0000000000000000000000001111111111111111111111111111111111111111"
            )),
        );
        assert_eq!(
            encode_topic(&ParamType::String, &Token::String("".into()), "name").unwrap(),
            H256(keccak256([])),
        );

        let ids = Token::Array(vec![Token::Uint(1.into()), Token::Uint(2.into())]);
        let mut packed = usize_word(1).to_vec();
        packed.extend_from_slice(&usize_word(2));
        assert_eq!(
            encode_topic(&"uint256[]".parse().unwrap(), &ids, "ids").unwrap(),
            H256(keccak256(packed)),
        );
    }
}
