//! Mapping between Rust types and ABI tokens.
//!
//! Generated bindings work with native Rust types and convert them to and
//! from [`Token`]s at the codec boundary. `Tokenize` covers the base types
//! and compounds of other `Tokenize` types: vectors, arrays and tuples.
//!
//! `Vec<u8>` and `[u8; N]` map to `bytes` and `bytesN` rather than to arrays
//! of `uint8`. To keep that from conflicting with a blanket implementation
//! for `Vec<T>`, sequences are only implemented for element types that are
//! also `TokenizeArray`, which every `Tokenize` type except `u8` is.

use crate::I256;
use arrayvec::ArrayVec;
use assetbind_common::abi::Token;
use assetbind_common::{Address, H256, U256};
use std::convert::{TryFrom, TryInto};

/// A tokenization error.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The token kind does not match the Rust type.
    #[error("expected a different token type")]
    TypeMismatch,
    /// An integer token does not fit in the Rust integer type.
    #[error("abi integer does not fit rust integer")]
    IntegerMismatch,
    /// Fixed bytes with the wrong length.
    #[error("expected a different number of fixed bytes")]
    FixedBytesLengthsMismatch,
    /// A fixed array with the wrong length.
    #[error("expected a different number of tokens in fixed array")]
    FixedArrayLengthsMismatch,
    /// A tuple with the wrong arity.
    #[error("expected a different number of tokens in tuple")]
    TupleLengthMismatch,
}

/// Conversion between a Rust type and a single token.
pub trait Tokenize {
    /// Converts a token into `Self`.
    fn from_token(token: Token) -> Result<Self, Error>
    where
        Self: Sized;

    /// Converts `self` into a token.
    fn into_token(self) -> Token;
}

/// Unpacks a tuple token into exactly `N` component tokens.
///
/// Generated structs use this to destructure their tuple encoding.
pub fn into_tuple<const N: usize>(token: Token) -> Result<[Token; N], Error> {
    match token {
        Token::Tuple(tokens) => tokens.try_into().map_err(|_| Error::TupleLengthMismatch),
        _ => Err(Error::TypeMismatch),
    }
}

impl Tokenize for Token {
    fn from_token(token: Token) -> Result<Self, Error> {
        Ok(token)
    }

    fn into_token(self) -> Token {
        self
    }
}

impl Tokenize for Vec<u8> {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::Bytes(bytes) => Ok(bytes),
            _ => Err(Error::TypeMismatch),
        }
    }

    fn into_token(self) -> Token {
        Token::Bytes(self)
    }
}

impl Tokenize for String {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::String(s) => Ok(s),
            _ => Err(Error::TypeMismatch),
        }
    }

    fn into_token(self) -> Token {
        Token::String(self)
    }
}

impl Tokenize for Address {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::Address(address) => Ok(address),
            _ => Err(Error::TypeMismatch),
        }
    }

    fn into_token(self) -> Token {
        Token::Address(self)
    }
}

/// `bytes32` values, and the topic hashes of indexed reference types.
impl Tokenize for H256 {
    fn from_token(token: Token) -> Result<Self, Error> {
        <[u8; 32]>::from_token(token).map(H256)
    }

    fn into_token(self) -> Token {
        self.0.into_token()
    }
}

impl Tokenize for U256 {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::Uint(value) => Ok(value),
            _ => Err(Error::TypeMismatch),
        }
    }

    fn into_token(self) -> Token {
        Token::Uint(self)
    }
}

impl Tokenize for I256 {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::Int(raw) => Ok(I256::from_raw(raw)),
            _ => Err(Error::TypeMismatch),
        }
    }

    fn into_token(self) -> Token {
        Token::Int(self.into_raw())
    }
}

impl Tokenize for bool {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::Bool(value) => Ok(value),
            _ => Err(Error::TypeMismatch),
        }
    }

    fn into_token(self) -> Token {
        Token::Bool(self)
    }
}

macro_rules! uint_tokenize {
    ($($int:ty),*) => {
        $(
            impl Tokenize for $int {
                fn from_token(token: Token) -> Result<Self, Error> {
                    match token {
                        Token::Uint(value) => value.try_into().map_err(|_| Error::IntegerMismatch),
                        _ => Err(Error::TypeMismatch),
                    }
                }

                fn into_token(self) -> Token {
                    Token::Uint(self.into())
                }
            }
        )*
    };
}

macro_rules! int_tokenize {
    ($($int:ty),*) => {
        $(
            impl Tokenize for $int {
                fn from_token(token: Token) -> Result<Self, Error> {
                    match token {
                        Token::Int(raw) => <$int>::try_from(I256::from_raw(raw))
                            .map_err(|_| Error::IntegerMismatch),
                        _ => Err(Error::TypeMismatch),
                    }
                }

                fn into_token(self) -> Token {
                    Token::Int(I256::from(self).into_raw())
                }
            }
        )*
    };
}

uint_tokenize!(u8, u16, u32, u64, u128);
int_tokenize!(i8, i16, i32, i64, i128);

/// Marker for `Tokenize` types that can be elements of `Token::Array` and
/// `Token::FixedArray`. This is everything except `u8`.
pub trait TokenizeArray: Tokenize {}

macro_rules! tokenize_array {
    ($($type:ty,)*) => {
        $(
            impl TokenizeArray for $type {}
        )*
    };
}

tokenize_array! {
    Token, String, Address, H256, U256, I256, Vec<u8>, bool,
    i8, i16, i32, i64, i128, u16, u32, u64, u128,
}

impl<T: TokenizeArray> Tokenize for Vec<T> {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::FixedArray(tokens) | Token::Array(tokens) => {
                tokens.into_iter().map(T::from_token).collect()
            }
            _ => Err(Error::TypeMismatch),
        }
    }

    fn into_token(self) -> Token {
        Token::Array(self.into_iter().map(T::into_token).collect())
    }
}

impl<T: TokenizeArray> TokenizeArray for Vec<T> {}

impl<T: TokenizeArray, const N: usize> Tokenize for [T; N] {
    fn from_token(token: Token) -> Result<Self, Error> {
        let tokens = match token {
            Token::FixedArray(tokens) => tokens,
            _ => return Err(Error::TypeMismatch),
        };
        if tokens.len() != N {
            return Err(Error::FixedArrayLengthsMismatch);
        }
        tokens
            .into_iter()
            .map(T::from_token)
            .collect::<Result<ArrayVec<T, N>, _>>()?
            .into_inner()
            .map_err(|_| Error::FixedArrayLengthsMismatch)
    }

    fn into_token(self) -> Token {
        Token::FixedArray(self.into_iter().map(T::into_token).collect())
    }
}

impl<T: TokenizeArray, const N: usize> TokenizeArray for [T; N] {}

impl<const N: usize> Tokenize for [u8; N] {
    fn from_token(token: Token) -> Result<Self, Error> {
        match token {
            Token::FixedBytes(bytes) => bytes
                .try_into()
                .map_err(|_| Error::FixedBytesLengthsMismatch),
            _ => Err(Error::TypeMismatch),
        }
    }

    fn into_token(self) -> Token {
        Token::FixedBytes(self.to_vec())
    }
}

impl<const N: usize> TokenizeArray for [u8; N] {}

macro_rules! impl_tuple_tokenize {
    ($count:expr, $( $ty:ident $var:ident : $no:tt, )*) => {
        impl<$($ty, )*> TokenizeArray for ($($ty,)*)
        where
            $($ty: Tokenize,)*
        {}

        impl<$($ty, )*> Tokenize for ($($ty,)*)
        where
            $($ty: Tokenize,)*
        {
            fn from_token(token: Token) -> Result<Self, Error> {
                let [$($var,)*] = into_tuple::<$count>(token)?;
                Ok(($($ty::from_token($var)?,)*))
            }

            fn into_token(self) -> Token {
                Token::Tuple(vec![$(self.$no.into_token(),)*])
            }
        }
    }
}

impl_tuple_tokenize!(0,);
impl_tuple_tokenize!(1, A a:0, );
impl_tuple_tokenize!(2, A a:0, B b:1, );
impl_tuple_tokenize!(3, A a:0, B b:1, C c:2, );
impl_tuple_tokenize!(4, A a:0, B b:1, C c:2, D d:3, );
impl_tuple_tokenize!(5, A a:0, B b:1, C c:2, D d:3, E e:4, );
impl_tuple_tokenize!(6, A a:0, B b:1, C c:2, D d:3, E e:4, F f:5, );
impl_tuple_tokenize!(7, A a:0, B b:1, C c:2, D d:3, E e:4, F f:5, G g:6, );
impl_tuple_tokenize!(8, A a:0, B b:1, C c:2, D d:3, E e:4, F f:5, G g:6, H h:7, );
impl_tuple_tokenize!(9, A a:0, B b:1, C c:2, D d:3, E e:4, F f:5, G g:6, H h:7, I i:8, );
impl_tuple_tokenize!(10, A a:0, B b:1, C c:2, D d:3, E e:4, F f:5, G g:6, H h:7, I i:8, J j:9, );
impl_tuple_tokenize!(11, A a:0, B b:1, C c:2, D d:3, E e:4, F f:5, G g:6, H h:7, I i:8, J j:9, K k:10, );
impl_tuple_tokenize!(12, A a:0, B b:1, C c:2, D d:3, E e:4, F f:5, G g:6, H h:7, I i:8, J j:9, K k:10, L l:11, );

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_roundtrip<T>(value: T)
    where
        T: Tokenize + Clone + std::fmt::Debug + Eq,
    {
        assert_eq!(value, T::from_token(value.clone().into_token()).unwrap());
    }

    #[test]
    fn single_tokenize_roundtrip() {
        assert_roundtrip(u8::MAX);
        assert_roundtrip(i8::MIN);
        assert_roundtrip(u32::MAX);
        assert_roundtrip(i32::MIN);
        assert_roundtrip(i128::MAX);
        assert_roundtrip(U256::MAX);
        assert_roundtrip(I256::MIN);
        assert_roundtrip(I256::MAX);
        assert_roundtrip(true);
        assert_roundtrip("Redbelly".to_owned());
        assert_roundtrip(vec![0u8, 1, 2]);
        assert_roundtrip([7u8; 32]);
        assert_roundtrip(Address::from_low_u64_be(42));
        assert_roundtrip(H256::from_low_u64_be(42));
        assert_roundtrip(());
        assert_roundtrip((-1i8, 1u16));
        assert_roundtrip([-1i32, 1i32]);
    }

    #[test]
    fn bytes_are_not_arrays() {
        assert!(matches!([0u8].into_token(), Token::FixedBytes(_)));
        assert!(matches!(vec![0u8].into_token(), Token::Bytes(_)));
        assert!(matches!(vec![0u16].into_token(), Token::Array(_)));
    }

    #[test]
    fn nested_compound() {
        let rust = (vec![[(0u8, 1i8)]], false);
        let token = Token::Tuple(vec![
            Token::Array(vec![Token::FixedArray(vec![Token::Tuple(vec![
                Token::Uint(0.into()),
                Token::Int(1.into()),
            ])])]),
            Token::Bool(false),
        ]);
        assert_eq!(rust.clone().into_token(), token);
        assert_roundtrip(rust);
    }

    #[test]
    fn mismatches() {
        assert_eq!(u8::from_token(Token::Uint(256.into())), Err(Error::IntegerMismatch));
        assert_eq!(i8::from_token(Token::Int(U256::MAX)), Ok(-1));
        assert_eq!(u8::from_token(Token::Int(1.into())), Err(Error::TypeMismatch));
        assert_eq!(
            <[u8; 4]>::from_token(Token::FixedBytes(vec![1, 2, 3])),
            Err(Error::FixedBytesLengthsMismatch)
        );
        assert_eq!(
            <[bool; 2]>::from_token(Token::FixedArray(vec![Token::Bool(true)])),
            Err(Error::FixedArrayLengthsMismatch)
        );
        assert_eq!(
            <(bool, bool)>::from_token(Token::Tuple(vec![Token::Bool(true)])),
            Err(Error::TupleLengthMismatch)
        );
    }

    #[test]
    fn i256_tokenization() {
        assert_eq!(I256::from(42).into_token(), 42i32.into_token());
        assert_eq!(I256::minus_one().into_token(), Token::Int(U256::MAX));
        assert_eq!(
            I256::from_token(Token::Int(U256::MAX)).unwrap(),
            I256::minus_one()
        );
    }
}
