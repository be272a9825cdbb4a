//! The cross-kind total order, equality, and hashing of values.
//!
//! Values order first by [`Kind::sort_order`](crate::Kind::sort_order) and then within a kind. The
//! four numeric kinds share one rank and compare by exact numeric value, so
//! `Int32(1) == Double(1.0) == Decimal128("1.00")`. NaN equals NaN and sorts
//! below every other number.

use std::{
    cmp::Ordering,
    hash::{Hash, Hasher},
};

use crate::{Array, Binary, BsonValue, Decimal128, Document, Element, Value, types::Decoded};

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Double(f64),
    Decimal(Decimal128),
}

impl Number {
    #[inline]
    fn of(value: &BsonValue) -> Option<Self> {
        match *value {
            BsonValue::Int32(n) => Some(Number::Int(n as i64)),
            BsonValue::Int64(n) => Some(Number::Int(n)),
            BsonValue::Double(n) => Some(Number::Double(n)),
            BsonValue::Decimal128(n) => Some(Number::Decimal(n)),
            _ => None,
        }
    }

    /// The nearest `f64`, with every NaN and both zeros collapsed.
    fn hash_bits(self) -> u64 {
        let f = match self {
            Number::Int(n) => n as f64,
            Number::Double(f) => f,
            Number::Decimal(d) => d.to_f64(),
        };
        if f.is_nan() {
            f64::NAN.to_bits()
        } else if f == 0.0 {
            0
        } else {
            f.to_bits()
        }
    }
}

/// An exactly represented number: `±0.digits × 10^point`.
///
/// Every `i64`, `f64`, and `Decimal128` has a finite decimal expansion, so
/// converting all three into this form orders them without rounding.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
enum Exact {
    NaN,
    NegInfinity,
    Finite(Finite),
    Infinity,
}

struct Finite {
    negative: bool,
    /// Significant digits without leading or trailing zeros; empty for zero.
    digits: String,
    point: i64,
}

impl Finite {
    /// `digits × 10^exponent`.
    fn new(negative: bool, digits: &str, exponent: i64) -> Self {
        let digits = digits.trim_start_matches('0');
        let point = exponent + digits.len() as i64;
        let digits = digits.trim_end_matches('0');
        if digits.is_empty() {
            return Finite {
                negative: false,
                digits: String::new(),
                point: 0,
            };
        }
        Finite {
            negative,
            digits: digits.to_owned(),
            point,
        }
    }

    #[inline]
    fn signum(&self) -> i8 {
        match (self.digits.is_empty(), self.negative) {
            (true, _) => 0,
            (false, true) => -1,
            (false, false) => 1,
        }
    }
}

impl Ord for Finite {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b) = (self.signum(), other.signum());
        if a != b || a == 0 {
            return a.cmp(&b);
        }
        let magnitude = self
            .point
            .cmp(&other.point)
            .then_with(|| self.digits.cmp(&other.digits));
        if a > 0 { magnitude } else { magnitude.reverse() }
    }
}

impl PartialOrd for Finite {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Finite {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Finite {}

impl From<Number> for Exact {
    fn from(number: Number) -> Self {
        match number {
            Number::Int(n) => {
                Exact::Finite(Finite::new(n < 0, &n.unsigned_abs().to_string(), 0))
            }
            Number::Double(f) if f.is_nan() => Exact::NaN,
            Number::Double(f) if f.is_infinite() => {
                if f > 0.0 {
                    Exact::Infinity
                } else {
                    Exact::NegInfinity
                }
            }
            Number::Double(f) => {
                // 1100 digits covers the longest exact expansion of any f64.
                let text = format!("{:.1100e}", f.abs());
                let (mantissa, exponent) = text.split_once('e').unwrap_or((&text, "0"));
                let exponent: i64 = exponent.parse().unwrap_or(0);
                let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
                let scale = exponent - (digits.len() as i64 - 1);
                Exact::Finite(Finite::new(f.is_sign_negative(), &digits, scale))
            }
            Number::Decimal(d) => match d.decode() {
                Decoded::NaN => Exact::NaN,
                Decoded::Infinity { negative: true } => Exact::NegInfinity,
                Decoded::Infinity { negative: false } => Exact::Infinity,
                Decoded::Finite {
                    negative,
                    coefficient,
                    exponent,
                } => Exact::Finite(Finite::new(
                    negative,
                    &coefficient.to_string(),
                    exponent as i64,
                )),
            },
        }
    }
}

#[inline]
fn compare_f64(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn compare_i64_f64(i: i64, f: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f.is_nan() {
        return Ordering::Greater;
    }
    if f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }
    let truncated = f.trunc();
    match i.cmp(&(truncated as i64)) {
        Ordering::Equal => compare_f64(truncated, f),
        ordering => ordering,
    }
}

fn compare_numbers(a: Number, b: Number) -> Ordering {
    match (a, b) {
        (Number::Int(x), Number::Int(y)) => x.cmp(&y),
        (Number::Double(x), Number::Double(y)) => compare_f64(x, y),
        (Number::Int(x), Number::Double(y)) => compare_i64_f64(x, y),
        (Number::Double(x), Number::Int(y)) => compare_i64_f64(y, x).reverse(),
        _ => Exact::from(a).cmp(&Exact::from(b)),
    }
}

fn compare_binary(a: &Binary, b: &Binary) -> Ordering {
    a.bytes
        .len()
        .cmp(&b.bytes.len())
        .then_with(|| u8::from(a.subtype).cmp(&u8::from(b.subtype)))
        .then_with(|| a.bytes.cmp(&b.bytes))
}

pub(crate) fn compare_values(a: &BsonValue, b: &BsonValue) -> Ordering {
    if let (Some(x), Some(y)) = (Number::of(a), Number::of(b)) {
        return compare_numbers(x, y);
    }
    match (a, b) {
        (BsonValue::MinKey, BsonValue::MinKey)
        | (BsonValue::Null, BsonValue::Null)
        | (BsonValue::MaxKey, BsonValue::MaxKey) => Ordering::Equal,
        (BsonValue::String(x), BsonValue::String(y))
        | (BsonValue::Symbol(x), BsonValue::Symbol(y))
        | (BsonValue::JavaScript(x), BsonValue::JavaScript(y)) => x.cmp(y),
        (BsonValue::Document(x), BsonValue::Document(y)) => x.cmp(y),
        (BsonValue::Array(x), BsonValue::Array(y)) => x.cmp(y),
        (BsonValue::Binary(x), BsonValue::Binary(y)) => compare_binary(x, y),
        (BsonValue::ObjectId(x), BsonValue::ObjectId(y)) => x.cmp(y),
        (BsonValue::Boolean(x), BsonValue::Boolean(y)) => x.cmp(y),
        (BsonValue::DateTime(x), BsonValue::DateTime(y)) => x.cmp(y),
        (BsonValue::Timestamp(x), BsonValue::Timestamp(y)) => x.cmp(y),
        (BsonValue::RegularExpression(x), BsonValue::RegularExpression(y)) => x.cmp(y),
        (
            BsonValue::JavaScriptWithScope {
                code: code_a,
                scope: scope_a,
            },
            BsonValue::JavaScriptWithScope {
                code: code_b,
                scope: scope_b,
            },
        ) => code_a.cmp(code_b).then_with(|| scope_a.cmp(scope_b)),
        _ => a.kind().sort_order().cmp(&b.kind().sort_order()),
    }
}

fn hash_value<H: Hasher>(value: &BsonValue, state: &mut H) {
    value.kind().sort_order().hash(state);
    if let Some(number) = Number::of(value) {
        return number.hash_bits().hash(state);
    }
    match value {
        BsonValue::String(text) | BsonValue::Symbol(text) | BsonValue::JavaScript(text) => {
            text.hash(state)
        }
        BsonValue::Document(document) => document.hash(state),
        BsonValue::Array(array) => array.hash(state),
        BsonValue::Binary(binary) => binary.hash(state),
        BsonValue::ObjectId(id) => id.hash(state),
        BsonValue::Boolean(b) => b.hash(state),
        BsonValue::DateTime(dt) => dt.hash(state),
        BsonValue::Timestamp(ts) => ts.hash(state),
        BsonValue::RegularExpression(regex) => regex.hash(state),
        BsonValue::JavaScriptWithScope { code, scope } => {
            code.hash(state);
            scope.hash(state);
        }
        _ => {}
    }
}

impl Value {
    /// Compares only the kinds' positions in the cross-kind order.
    ///
    /// Any value sorts after an absent one.
    pub fn compare_type_to(&self, other: Option<&Value>) -> Ordering {
        match other {
            Some(other) => self.kind().sort_order().cmp(&other.kind().sort_order()),
            None => Ordering::Greater,
        }
    }

    /// Full comparison in the cross-kind order.
    ///
    /// Any value sorts after an absent one.
    pub fn compare_to(&self, other: Option<&Value>) -> Ordering {
        match other {
            Some(other) => self.cmp(other),
            None => Ordering::Greater,
        }
    }
}

impl PartialEq for BsonValue {
    fn eq(&self, other: &Self) -> bool {
        compare_values(self, other) == Ordering::Equal
    }
}

impl Eq for BsonValue {}

impl PartialOrd for BsonValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BsonValue {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_values(self, other)
    }
}

impl Hash for BsonValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(self, state)
    }
}

impl PartialEq for Value {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Value::ptr_eq(self, other) || compare_values(self, other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        if Value::ptr_eq(self, other) {
            return Ordering::Equal;
        }
        compare_values(self, other)
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_value(self, state)
    }
}

/// Lexicographic over the paired sequences, then shorter first.
fn compare_sequences<T, A, B>(mut a: A, mut b: B, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering
where
    A: Iterator<Item = T>,
    B: Iterator<Item = T>,
{
    loop {
        match (a.next(), b.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match cmp(&x, &y) {
                Ordering::Equal => {}
                ordering => return ordering,
            },
        }
    }
}

fn compare_elements(a: &Element, b: &Element) -> Ordering {
    a.name()
        .cmp(b.name())
        .then_with(|| a.value().cmp(b.value()))
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_sequences(self.iter(), other.iter(), compare_elements)
    }
}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for element in self {
            element.name().hash(state);
            element.value().hash(state);
        }
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Array {}

impl PartialOrd for Array {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Array {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_sequences(self.iter(), other.iter(), |a: &Value, b: &Value| a.cmp(b))
    }
}

impl Hash for Array {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for value in self {
            value.hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(number: Number) -> Exact {
        Exact::from(number)
    }

    #[test]
    fn exact_expansion_of_doubles() {
        assert!(exact(Number::Double(0.1)) > exact(Number::Decimal("0.1".parse().unwrap())));
        assert!(exact(Number::Double(0.5)) == exact(Number::Decimal("0.50".parse().unwrap())));
        assert!(exact(Number::Double(-0.0)) == exact(Number::Int(0)));
        assert!(exact(Number::Double(f64::MIN_POSITIVE)) > exact(Number::Int(0)));
    }

    #[test]
    fn integer_and_double_near_the_edges() {
        assert_eq!(compare_i64_f64(i64::MAX, 9.223372036854775807e18), Ordering::Less);
        assert_eq!(compare_i64_f64(i64::MIN, -9.223372036854775808e18), Ordering::Equal);
        assert_eq!(compare_i64_f64(3, 3.5), Ordering::Less);
        assert_eq!(compare_i64_f64(-3, -3.5), Ordering::Greater);
        assert_eq!(compare_i64_f64(0, f64::NAN), Ordering::Greater);
        assert_eq!(compare_i64_f64(0, f64::NEG_INFINITY), Ordering::Greater);
    }

    #[test]
    fn decimal_against_large_integers() {
        let big: Decimal128 = "9223372036854775807".parse().unwrap();
        assert_eq!(
            compare_numbers(Number::Int(i64::MAX), Number::Decimal(big)),
            Ordering::Equal
        );
        assert_eq!(
            compare_numbers(Number::Int(i64::MAX - 1), Number::Decimal(big)),
            Ordering::Less
        );
        assert_eq!(
            compare_numbers(Number::Decimal(Decimal128::NAN), Number::Double(f64::NAN)),
            Ordering::Equal
        );
    }
}
