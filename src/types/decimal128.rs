use std::{fmt, str::FromStr};

use crate::{Error, Result};

const EXPONENT_BIAS: i32 = 6176;
pub(crate) const MAX_EXPONENT: i32 = 6111;
pub(crate) const MIN_EXPONENT: i32 = -6176;
const MAX_DIGITS: usize = 34;
const MAX_COEFFICIENT: u128 = 10u128.pow(MAX_DIGITS as u32) - 1;

const NAN_HIGH: u64 = 0x7C00_0000_0000_0000;
const INFINITY_HIGH: u64 = 0x7800_0000_0000_0000;
const SIGN_BIT: u64 = 1 << 63;

/// An IEEE 754-2008 128-bit decimal floating point number in the binary
/// integer decimal (BID) encoding.
///
/// `PartialEq` on this type compares encodings bit for bit; numeric equality
/// across representations (`1.0` vs `1.00`) is provided by
/// [`Value`](crate::Value) comparison.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal128 {
    bytes: [u8; 16],
}

/// The decoded form of a [`Decimal128`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Decoded {
    NaN,
    Infinity {
        negative: bool,
    },
    Finite {
        negative: bool,
        coefficient: u128,
        exponent: i32,
    },
}

impl Decimal128 {
    pub const NAN: Self = Self::from_halves(NAN_HIGH, 0);
    pub const INFINITY: Self = Self::from_halves(INFINITY_HIGH, 0);
    pub const NEG_INFINITY: Self = Self::from_halves(INFINITY_HIGH | SIGN_BIT, 0);
    pub const ZERO: Self = Self::from_halves((EXPONENT_BIAS as u64) << 49, 0);

    /// Creates a decimal from its 16-byte little-endian encoding.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self { bytes }
    }

    #[inline]
    pub const fn bytes(&self) -> [u8; 16] {
        self.bytes
    }

    const fn from_halves(high: u64, low: u64) -> Self {
        let low = low.to_le_bytes();
        let high = high.to_le_bytes();
        let mut bytes = [0u8; 16];
        let mut i = 0;
        while i < 8 {
            bytes[i] = low[i];
            bytes[8 + i] = high[i];
            i += 1;
        }
        Self { bytes }
    }

    fn halves(&self) -> (u64, u64) {
        let mut low = [0u8; 8];
        let mut high = [0u8; 8];
        low.copy_from_slice(&self.bytes[..8]);
        high.copy_from_slice(&self.bytes[8..]);
        (u64::from_le_bytes(high), u64::from_le_bytes(low))
    }

    fn from_parts(negative: bool, coefficient: u128, exponent: i32) -> Self {
        debug_assert!(coefficient <= MAX_COEFFICIENT);
        debug_assert!((MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent));
        let biased = (exponent + EXPONENT_BIAS) as u64;
        let sign = if negative { SIGN_BIT } else { 0 };
        let high = sign | (biased << 49) | (coefficient >> 64) as u64;
        Self::from_halves(high, coefficient as u64)
    }

    pub(crate) fn decode(&self) -> Decoded {
        let (high, low) = self.halves();
        let negative = high & SIGN_BIT != 0;
        let combination = (high >> 58) & 0x1F;
        if combination == 0x1F {
            return Decoded::NaN;
        }
        if combination == 0x1E {
            return Decoded::Infinity { negative };
        }
        if (high >> 61) & 0b11 == 0b11 {
            // The implied coefficient is at least 2^113, which is never canonical.
            let exponent = ((high >> 47) & 0x3FFF) as i32 - EXPONENT_BIAS;
            return Decoded::Finite {
                negative,
                coefficient: 0,
                exponent,
            };
        }
        let exponent = ((high >> 49) & 0x3FFF) as i32 - EXPONENT_BIAS;
        let coefficient = (((high & 0x0001_FFFF_FFFF_FFFF) as u128) << 64) | low as u128;
        Decoded::Finite {
            negative,
            coefficient: if coefficient > MAX_COEFFICIENT {
                0
            } else {
                coefficient
            },
            exponent,
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self.decode(), Decoded::NaN)
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self.decode(), Decoded::Infinity { .. })
    }

    pub fn is_zero(&self) -> bool {
        matches!(self.decode(), Decoded::Finite { coefficient: 0, .. })
    }

    pub fn is_sign_negative(&self) -> bool {
        self.halves().0 & SIGN_BIT != 0
    }

    pub fn from_i64(value: i64) -> Self {
        Self::from_parts(value < 0, value.unsigned_abs() as u128, 0)
    }

    pub fn from_i32(value: i32) -> Self {
        Self::from_i64(value as i64)
    }

    /// Converts through the shortest decimal string that round-trips `value`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_nan() {
            return Self::NAN;
        }
        if value.is_infinite() {
            return if value > 0.0 {
                Self::INFINITY
            } else {
                Self::NEG_INFINITY
            };
        }
        // At most 17 significant digits, always representable.
        Self::parse(&format!("{value:e}")).unwrap_or(Self::NAN)
    }

    /// Nearest `f64` to this decimal's exact value.
    pub fn to_f64(&self) -> f64 {
        match self.decode() {
            Decoded::NaN => f64::NAN,
            Decoded::Infinity { negative: true } => f64::NEG_INFINITY,
            Decoded::Infinity { negative: false } => f64::INFINITY,
            Decoded::Finite { .. } => self.to_string().parse().unwrap_or(f64::NAN),
        }
    }

    /// Rounds to the nearest integer, ties away from zero, or `None` when
    /// the result is not finite or does not fit an `i64`.
    pub fn round_to_i64(&self) -> Option<i64> {
        let Decoded::Finite {
            negative,
            coefficient,
            exponent,
        } = self.decode()
        else {
            return None;
        };
        let magnitude = if exponent >= 0 {
            10u128
                .checked_pow(exponent as u32)
                .and_then(|scale| coefficient.checked_mul(scale))?
        } else if -exponent > MAX_DIGITS as i32 {
            0
        } else {
            let divisor = 10u128.pow((-exponent) as u32);
            let quotient = coefficient / divisor;
            let remainder = coefficient % divisor;
            if remainder * 2 >= divisor {
                quotient + 1
            } else {
                quotient
            }
        };
        if negative {
            if magnitude <= i64::MAX as u128 + 1 {
                Some((magnitude as i128).wrapping_neg() as i64)
            } else {
                None
            }
        } else {
            i64::try_from(magnitude).ok()
        }
    }

    /// Parses decimal notation (`"-1.50"`, `"1E+3"`, `"NaN"`, `"-Infinity"`).
    ///
    /// Values that need more than 34 significant digits, or whose exponent
    /// cannot be brought into range without losing digits, are rejected.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::Format(format!("'{s}' is not a valid Decimal128"));

        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        if body.eq_ignore_ascii_case("nan") {
            return Ok(Self::NAN);
        }
        if body.eq_ignore_ascii_case("inf") || body.eq_ignore_ascii_case("infinity") {
            return Ok(if negative {
                Self::NEG_INFINITY
            } else {
                Self::INFINITY
            });
        }

        let (mantissa, exponent_text) = match body.find(['e', 'E']) {
            Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
            None => (body, None),
        };
        let mut exponent: i64 = match exponent_text {
            Some(text) => text.parse().map_err(|_| invalid())?,
            None => 0,
        };
        let (integral, fraction) = match mantissa.find('.') {
            Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
            None => (mantissa, ""),
        };
        if integral.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !integral.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        exponent = exponent
            .checked_sub(fraction.len() as i64)
            .ok_or_else(invalid)?;
        let joined = format!("{integral}{fraction}");
        let mut digits = joined.trim_start_matches('0');
        while digits.len() > MAX_DIGITS && digits.ends_with('0') {
            digits = &digits[..digits.len() - 1];
            exponent = exponent.checked_add(1).ok_or_else(invalid)?;
        }
        if digits.len() > MAX_DIGITS {
            return Err(invalid());
        }

        let mut coefficient: u128 = if digits.is_empty() {
            0
        } else {
            digits.parse().map_err(|_| invalid())?
        };

        if coefficient == 0 {
            exponent = exponent.clamp(MIN_EXPONENT as i64, MAX_EXPONENT as i64);
        }
        while exponent > MAX_EXPONENT as i64 {
            match coefficient.checked_mul(10) {
                Some(scaled) if scaled <= MAX_COEFFICIENT => {
                    coefficient = scaled;
                    exponent -= 1;
                }
                _ => return Err(invalid()),
            }
        }
        while exponent < MIN_EXPONENT as i64 {
            if coefficient % 10 != 0 {
                return Err(invalid());
            }
            coefficient /= 10;
            exponent += 1;
        }

        Ok(Self::from_parts(negative, coefficient, exponent as i32))
    }
}

impl Default for Decimal128 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for Decimal128 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<i32> for Decimal128 {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl From<i64> for Decimal128 {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (negative, coefficient, exponent) = match self.decode() {
            Decoded::NaN => return f.write_str("NaN"),
            Decoded::Infinity { negative: true } => return f.write_str("-Infinity"),
            Decoded::Infinity { negative: false } => return f.write_str("Infinity"),
            Decoded::Finite {
                negative,
                coefficient,
                exponent,
            } => (negative, coefficient, exponent),
        };

        let digits = coefficient.to_string();
        let adjusted = exponent + digits.len() as i32 - 1;
        if negative {
            f.write_str("-")?;
        }

        if exponent > 0 || adjusted < -6 {
            f.write_str(&digits[..1])?;
            if digits.len() > 1 {
                write!(f, ".{}", &digits[1..])?;
            }
            if adjusted >= 0 {
                write!(f, "E+{adjusted}")
            } else {
                write!(f, "E{adjusted}")
            }
        } else if exponent == 0 {
            f.write_str(&digits)
        } else {
            let point = digits.len() as i32 + exponent;
            if point > 0 {
                let point = point as usize;
                write!(f, "{}.{}", &digits[..point], &digits[point..])
            } else {
                write!(f, "0.{}{digits}", "0".repeat((-point) as usize))
            }
        }
    }
}

impl fmt::Debug for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal128({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_the_reference_corpus() {
        let cases = [
            ("0", "0"),
            ("-0", "-0"),
            ("1", "1"),
            ("-1", "-1"),
            ("0.1", "0.1"),
            ("1.50", "1.50"),
            ("0.001234", "0.001234"),
            ("0.0000001234", "1.234E-7"),
            ("1E+3", "1E+3"),
            ("123E-2", "1.23"),
            ("9999999999999999999999999999999999", "9999999999999999999999999999999999"),
        ];
        for (input, expected) in cases {
            assert_eq!(Decimal128::parse(input).unwrap().to_string(), expected, "{input}");
        }
    }

    #[test]
    fn specials() {
        assert!(Decimal128::parse("NaN").unwrap().is_nan());
        assert_eq!(Decimal128::parse("-inf").unwrap(), Decimal128::NEG_INFINITY);
        assert_eq!(Decimal128::INFINITY.to_string(), "Infinity");
        assert!(Decimal128::parse("").is_err());
        assert!(Decimal128::parse("1.2.3").is_err());
        assert!(Decimal128::parse("12345678901234567890123456789012345").is_err());
    }

    #[test]
    fn extreme_exponents_are_rejected() {
        assert!(Decimal128::parse("1.5e-9223372036854775808").is_err());
        assert!(Decimal128::parse("100000000000000000000000000000000000e9223372036854775807").is_err());
        assert!(Decimal128::parse("1e9223372036854775807").is_err());
        assert!(Decimal128::parse("0e-9223372036854775808").unwrap().is_zero());
    }

    #[test]
    fn trailing_zeros_beyond_precision_are_folded_into_the_exponent() {
        let d = Decimal128::parse("10000000000000000000000000000000000").unwrap();
        assert_eq!(d.to_string(), "1.000000000000000000000000000000000E+34");
    }

    #[test]
    fn rounding_to_integers() {
        assert_eq!(Decimal128::parse("2.5").unwrap().round_to_i64(), Some(3));
        assert_eq!(Decimal128::parse("-2.5").unwrap().round_to_i64(), Some(-3));
        assert_eq!(Decimal128::parse("2.4").unwrap().round_to_i64(), Some(2));
        assert_eq!(Decimal128::parse("1E+30").unwrap().round_to_i64(), None);
        assert_eq!(Decimal128::NAN.round_to_i64(), None);
    }

    #[test]
    fn f64_round_trip() {
        assert_eq!(Decimal128::from_f64(1.5).to_string(), "1.5");
        assert_eq!(Decimal128::from_f64(1.5).to_f64(), 1.5);
        assert_eq!(Decimal128::from_i64(i64::MIN).to_string(), i64::MIN.to_string());
    }
}
