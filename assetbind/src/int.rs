//! A 256-bit signed integer carried as its two's complement word.

use crate::errors::{ParseI256Error, TryFromBigIntError};
use assetbind_common::U256;
use std::cmp::Ordering;
use std::convert::TryFrom;
use std::fmt;
use std::str::{self, FromStr};

fn twos_complement(u: U256) -> U256 {
    let (negated, _) = (!u).overflowing_add(U256::one());
    negated
}

/// Signed 256-bit integer, the Rust carrier for `intN` with `N > 32`.
///
/// The value is stored as the raw two's complement word, which is also its
/// ABI encoding, so conversion to and from tokens is free.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct I256(U256);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Sign {
    Positive,
    Negative,
}

impl I256 {
    /// The smallest representable value, `-2^255`.
    pub const MIN: I256 = I256(U256([0, 0, 0, 1 << 63]));

    /// The largest representable value, `2^255 - 1`.
    pub const MAX: I256 = I256(U256([u64::MAX, u64::MAX, u64::MAX, u64::MAX >> 1]));

    /// Zero.
    pub fn zero() -> Self {
        I256(U256::zero())
    }

    /// Negative one.
    pub fn minus_one() -> Self {
        I256(U256::MAX)
    }

    fn sign(self) -> Sign {
        if self.0.bit(255) {
            Sign::Negative
        } else {
            Sign::Positive
        }
    }

    fn checked_from_sign_and_abs(sign: Sign, abs: U256) -> Option<Self> {
        let value = I256(match sign {
            Sign::Positive => abs,
            Sign::Negative => twos_complement(abs),
        });
        // `-0` has a positive sign, every other mismatch is an overflow.
        if value.sign() == sign || abs.is_zero() {
            Some(value)
        } else {
            None
        }
    }

    fn into_sign_and_abs(self) -> (Sign, U256) {
        let sign = self.sign();
        let abs = match sign {
            Sign::Positive => self.0,
            Sign::Negative => twos_complement(self.0),
        };
        (sign, abs)
    }

    /// Reinterprets a raw 256-bit word as a signed integer. Words with the
    /// high bit set become negative.
    pub fn from_raw(raw: U256) -> Self {
        I256(raw)
    }

    /// Returns the raw two's complement word.
    pub fn into_raw(self) -> U256 {
        self.0
    }

    /// Returns `true` if the value is negative.
    pub fn is_negative(self) -> bool {
        self.sign() == Sign::Negative
    }

    /// Truncating conversion to `i64`.
    pub fn low_i64(&self) -> i64 {
        self.0.low_u64() as _
    }

    /// Truncating conversion to `i128`.
    pub fn low_i128(&self) -> i128 {
        self.0.low_u128() as _
    }

    /// Parses a decimal string with an optional leading sign.
    pub fn from_dec_str(value: &str) -> Result<Self, ParseI256Error> {
        let (sign, value) = split_sign(value);
        let abs = U256::from_dec_str(value)?;
        I256::checked_from_sign_and_abs(sign, abs).ok_or(ParseI256Error::IntegerOverflow)
    }

    /// Parses a hexadecimal string, without `0x` prefix, with an optional
    /// leading sign.
    pub fn from_hex_str(value: &str) -> Result<Self, ParseI256Error> {
        let (sign, value) = split_sign(value);
        if value.is_empty() {
            return Err(ParseI256Error::InvalidDigit);
        }
        if value.len() > 64 {
            return Err(ParseI256Error::IntegerOverflow);
        }

        let mut abs = U256::zero();
        for (i, word) in value.as_bytes().rchunks(16).enumerate() {
            let word = str::from_utf8(word).map_err(|_| ParseI256Error::InvalidDigit)?;
            abs.0[i] = u64::from_str_radix(word, 16).map_err(|_| ParseI256Error::InvalidDigit)?;
        }
        I256::checked_from_sign_and_abs(sign, abs).ok_or(ParseI256Error::IntegerOverflow)
    }
}

fn split_sign(value: &str) -> (Sign, &str) {
    if let Some(rest) = value.strip_prefix('-') {
        (Sign::Negative, rest)
    } else {
        (Sign::Positive, value.strip_prefix('+').unwrap_or(value))
    }
}

macro_rules! impl_from {
    ($( $t:ty ),*) => {
        $(
            impl From<$t> for I256 {
                fn from(value: $t) -> Self {
                    #[allow(unused_comparisons)]
                    I256(if value < 0 {
                        let abs = (u128::MAX ^ (value as u128)).wrapping_add(1);
                        twos_complement(U256::from(abs))
                    } else {
                        U256::from(value)
                    })
                }
            }

            impl TryFrom<I256> for $t {
                type Error = TryFromBigIntError;

                fn try_from(value: I256) -> Result<Self, Self::Error> {
                    if value < I256::from(<$t>::MIN) || value > I256::from(<$t>::MAX) {
                        return Err(TryFromBigIntError);
                    }
                    Ok(value.0.low_u128() as _)
                }
            }
        )*
    };
}

impl_from!(i8, u8, i16, u16, i32, u32, i64, u64, i128, u128, isize, usize);

impl TryFrom<U256> for I256 {
    type Error = TryFromBigIntError;

    fn try_from(from: U256) -> Result<Self, Self::Error> {
        let value = I256(from);
        match value.sign() {
            Sign::Positive => Ok(value),
            Sign::Negative => Err(TryFromBigIntError),
        }
    }
}

impl TryFrom<I256> for U256 {
    type Error = TryFromBigIntError;

    fn try_from(value: I256) -> Result<Self, Self::Error> {
        match value.sign() {
            Sign::Positive => Ok(value.0),
            Sign::Negative => Err(TryFromBigIntError),
        }
    }
}

impl FromStr for I256 {
    type Err = ParseI256Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        I256::from_dec_str(value)
    }
}

impl fmt::Debug for I256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self, f.sign_plus()) {
            (Sign::Positive, false) => Ok(()),
            (Sign::Positive, true) => f.write_str("+"),
            (Sign::Negative, _) => f.write_str("-"),
        }
    }
}

impl fmt::Display for I256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (sign, abs) = self.into_sign_and_abs();
        fmt::Display::fmt(&sign, f)?;
        write!(f, "{}", abs)
    }
}

impl fmt::LowerHex for I256 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (sign, abs) = self.into_sign_and_abs();
        fmt::Display::fmt(&sign, f)?;
        write!(f, "{:x}", abs)
    }
}

impl Ord for I256 {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.into_sign_and_abs(), other.into_sign_and_abs()) {
            ((Sign::Positive, _), (Sign::Negative, _)) => Ordering::Greater,
            ((Sign::Negative, _), (Sign::Positive, _)) => Ordering::Less,
            ((Sign::Positive, this), (Sign::Positive, other)) => this.cmp(&other),
            ((Sign::Negative, this), (Sign::Negative, other)) => other.cmp(&this),
        }
    }
}

impl PartialOrd for I256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PI: &str = "314159265358979323846264338327950288419716";

    #[test]
    fn native_conversions() {
        assert_eq!(I256::from(-42i32).to_string(), "-42");
        assert_eq!(I256::from(42u8).to_string(), "42");
        assert_eq!(I256::from(i128::MIN).to_string(), i128::MIN.to_string());
        assert_eq!(I256::from(u128::MAX).to_string(), u128::MAX.to_string());

        assert!(matches!(i8::try_from(I256::from(-42)), Ok(-42)));
        assert!(matches!(u8::try_from(I256::from(-42)), Err(_)));
        assert!(matches!(i16::try_from(I256::from_dec_str(PI).unwrap()), Err(_)));
        assert_eq!(I256::minus_one().into_raw(), U256::MAX);
        assert_eq!(I256::minus_one().low_i64(), -1);
    }

    #[test]
    fn unsigned_conversions() {
        let unsigned = U256::from_dec_str(PI).unwrap();
        let signed = I256::from_dec_str(PI).unwrap();
        assert_eq!(I256::try_from(unsigned).unwrap(), signed);
        assert_eq!(U256::try_from(signed).unwrap(), unsigned);
        assert!(I256::try_from(U256::MAX).is_err());
        assert!(U256::try_from(I256::from(-1)).is_err());
    }

    #[test]
    fn parse_bounds() {
        let min_abs = U256::one() << 255;
        assert_eq!(I256::from_dec_str(&format!("-{}", min_abs)).unwrap(), I256::MIN);
        assert!(matches!(
            I256::from_dec_str(&min_abs.to_string()),
            Err(ParseI256Error::IntegerOverflow)
        ));
        assert!(matches!(
            I256::from_dec_str("nope"),
            Err(ParseI256Error::InvalidDigit)
        ));
        assert_eq!(I256::from_hex_str("-ff").unwrap(), I256::from(-255));
        assert_eq!(I256::from_hex_str("+10").unwrap(), I256::from(16));
        assert_eq!(I256::from_dec_str("-0").unwrap(), I256::zero());
        assert_eq!(format!("{:x}", I256::MAX), format!("{:x}", min_abs - 1));
    }

    #[test]
    fn ordering() {
        assert!(I256::MIN < I256::from(-1));
        assert!(I256::from(-1) < I256::zero());
        assert!(I256::zero() < I256::MAX);
        assert!(I256::from(-2) < I256::from(-1));
        assert_eq!(format!("{:+}", I256::from(7)), "+7");
    }
}
