//! Narrowing conversions from a [`Value`] to host types.
//!
//! Each conversion either succeeds with the converted host value or fails
//! with one of three errors:
//!
//! - [`Error::InvalidCast`] when the value's kind has no conversion to the
//!   target at all (a document to a boolean, say).
//! - [`Error::Overflow`] when the number does not fit the target.
//! - [`Error::Format`] when a string does not parse as the target.
//!
//! Doubles and decimals convert to integers by rounding half away from zero.
//! Booleans convert to `0`/`1`, and numbers convert to booleans as
//! "non-zero is true".

use crate::{BsonValue, DateTime, Decimal128, Document, Error, ObjectId, Result, Value};

/// A host type that a [`Value`] can be converted into.
///
/// # Example
///
/// ```
/// use na_bson::{Error, Value};
///
/// assert_eq!(Value::from(1.5).convert::<i32>().unwrap(), 2);
/// assert_eq!(Value::from(-2.5).convert::<i64>().unwrap(), -3);
/// assert_eq!(Value::from("42").convert::<u8>().unwrap(), 42);
/// assert!(matches!(Value::from(300).convert::<u8>(), Err(Error::Overflow { .. })));
/// ```
pub trait FromBson: Sized {
    /// Human-readable target name used in error messages.
    const TARGET: &'static str;

    fn from_bson(value: &BsonValue) -> Result<Self>;
}

#[inline]
fn invalid_cast<T: FromBson>(value: &BsonValue) -> Error {
    Error::InvalidCast {
        from: value.kind(),
        to: T::TARGET,
    }
}

fn parse_failed(text: &str, target: &'static str) -> Error {
    Error::Format(format!("'{text}' is not a valid {target}"))
}

/// Rounds to the nearest integer, ties away from zero.
fn round_f64(value: f64, target: &'static str) -> Result<i128> {
    let rounded = value.round();
    if !rounded.is_finite() || rounded < i128::MIN as f64 || rounded >= i128::MAX as f64 {
        return Err(Error::Overflow { to: target });
    }
    Ok(rounded as i128)
}

fn integral(value: &BsonValue, target: &'static str) -> Result<Option<i128>> {
    Ok(Some(match value {
        BsonValue::Int32(n) => *n as i128,
        BsonValue::Int64(n) => *n as i128,
        BsonValue::Double(f) => round_f64(*f, target)?,
        BsonValue::Decimal128(d) => d
            .round_to_i64()
            .ok_or(Error::Overflow { to: target })? as i128,
        BsonValue::Boolean(b) => *b as i128,
        BsonValue::String(text) => text
            .trim()
            .parse::<i128>()
            .map_err(|_| parse_failed(text, target))?,
        _ => return Ok(None),
    }))
}

macro_rules! impl_integer {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromBson for $ty {
                const TARGET: &'static str = $name;

                fn from_bson(value: &BsonValue) -> Result<Self> {
                    match integral(value, Self::TARGET)? {
                        Some(n) => <$ty>::try_from(n).map_err(|_| Error::Overflow { to: Self::TARGET }),
                        None => Err(invalid_cast::<Self>(value)),
                    }
                }
            }
        )*
    };
}

impl_integer!(
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
);

impl FromBson for f64 {
    const TARGET: &'static str = "f64";

    fn from_bson(value: &BsonValue) -> Result<Self> {
        match value {
            BsonValue::Int32(n) => Ok(*n as f64),
            BsonValue::Int64(n) => Ok(*n as f64),
            BsonValue::Double(f) => Ok(*f),
            BsonValue::Decimal128(d) => Ok(d.to_f64()),
            BsonValue::Boolean(b) => Ok(*b as u8 as f64),
            BsonValue::String(text) => text
                .trim()
                .parse()
                .map_err(|_| parse_failed(text, Self::TARGET)),
            _ => Err(invalid_cast::<Self>(value)),
        }
    }
}

impl FromBson for f32 {
    const TARGET: &'static str = "f32";

    fn from_bson(value: &BsonValue) -> Result<Self> {
        let wide = f64::from_bson(value).map_err(|error| match error {
            Error::InvalidCast { from, .. } => Error::InvalidCast {
                from,
                to: Self::TARGET,
            },
            other => other,
        })?;
        if wide.is_finite() && wide.abs() > f32::MAX as f64 {
            return Err(Error::Overflow { to: Self::TARGET });
        }
        Ok(wide as f32)
    }
}

impl FromBson for Decimal128 {
    const TARGET: &'static str = "Decimal128";

    fn from_bson(value: &BsonValue) -> Result<Self> {
        match value {
            BsonValue::Int32(n) => Ok(Decimal128::from_i32(*n)),
            BsonValue::Int64(n) => Ok(Decimal128::from_i64(*n)),
            BsonValue::Double(f) => Ok(Decimal128::from_f64(*f)),
            BsonValue::Decimal128(d) => Ok(*d),
            BsonValue::Boolean(b) => Ok(Decimal128::from_i32(*b as i32)),
            BsonValue::String(text) => Decimal128::parse(text.trim()),
            _ => Err(invalid_cast::<Self>(value)),
        }
    }
}

impl FromBson for bool {
    const TARGET: &'static str = "bool";

    fn from_bson(value: &BsonValue) -> Result<Self> {
        match value {
            BsonValue::Boolean(b) => Ok(*b),
            BsonValue::Int32(n) => Ok(*n != 0),
            BsonValue::Int64(n) => Ok(*n != 0),
            BsonValue::Double(f) => Ok(*f != 0.0),
            BsonValue::Decimal128(d) => Ok(!d.is_zero()),
            BsonValue::String(text) => match text.trim() {
                t if t.eq_ignore_ascii_case("true") => Ok(true),
                t if t.eq_ignore_ascii_case("false") => Ok(false),
                _ => Err(parse_failed(text, Self::TARGET)),
            },
            _ => Err(invalid_cast::<Self>(value)),
        }
    }
}

impl FromBson for String {
    const TARGET: &'static str = "String";

    fn from_bson(value: &BsonValue) -> Result<Self> {
        match value {
            BsonValue::String(text) | BsonValue::Symbol(text) | BsonValue::JavaScript(text) => {
                Ok(text.clone())
            }
            BsonValue::Int32(n) => Ok(n.to_string()),
            BsonValue::Int64(n) => Ok(n.to_string()),
            BsonValue::Double(f) => Ok(f.to_string()),
            BsonValue::Decimal128(d) => Ok(d.to_string()),
            BsonValue::Boolean(b) => Ok(b.to_string()),
            BsonValue::ObjectId(id) => Ok(id.to_hex()),
            BsonValue::DateTime(dt) => Ok(dt.to_string()),
            _ => Err(invalid_cast::<Self>(value)),
        }
    }
}

impl FromBson for DateTime {
    const TARGET: &'static str = "DateTime";

    fn from_bson(value: &BsonValue) -> Result<Self> {
        match value {
            BsonValue::DateTime(dt) => Ok(*dt),
            BsonValue::String(text) => DateTime::parse_rfc3339(text),
            _ => Err(invalid_cast::<Self>(value)),
        }
    }
}

impl FromBson for ObjectId {
    const TARGET: &'static str = "ObjectId";

    fn from_bson(value: &BsonValue) -> Result<Self> {
        match value {
            BsonValue::ObjectId(id) => Ok(*id),
            BsonValue::String(text) => ObjectId::parse_str(text.trim()),
            _ => Err(invalid_cast::<Self>(value)),
        }
    }
}

impl FromBson for Document {
    const TARGET: &'static str = "Document";

    fn from_bson(value: &BsonValue) -> Result<Self> {
        match value {
            BsonValue::Document(document) => Ok(document.clone()),
            _ => Err(invalid_cast::<Self>(value)),
        }
    }
}

/// `Null` converts to `None`; anything else converts as `T`.
impl<T: FromBson> FromBson for Option<T> {
    const TARGET: &'static str = T::TARGET;

    fn from_bson(value: &BsonValue) -> Result<Self> {
        match value {
            BsonValue::Null => Ok(None),
            other => T::from_bson(other).map(Some),
        }
    }
}

impl Value {
    /// Converts this value to the host type `T`.
    #[inline]
    pub fn convert<T: FromBson>(&self) -> Result<T> {
        T::from_bson(self)
    }

    pub fn to_int32(&self) -> Result<i32> {
        self.convert()
    }

    pub fn to_int64(&self) -> Result<i64> {
        self.convert()
    }

    pub fn to_double(&self) -> Result<f64> {
        self.convert()
    }

    pub fn to_decimal128(&self) -> Result<Decimal128> {
        self.convert()
    }

    pub fn to_boolean(&self) -> Result<bool> {
        self.convert()
    }

    pub fn to_date_time(&self) -> Result<DateTime> {
        self.convert()
    }

    /// The value as host text: strings verbatim, scalars in their invariant
    /// textual form.
    pub fn to_host_string(&self) -> Result<String> {
        self.convert()
    }
}
