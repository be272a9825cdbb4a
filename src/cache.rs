//! Process-wide singletons for small numbers and unit-like values.
//!
//! The table is built once, on first use, and is read-only afterwards, so
//! lookups need no synchronization beyond the one-time initialization.
//! Because every handed-out [`Value`] shares its payload with the table,
//! [`Value::make_mut`] always copies before mutating and the cached payloads
//! never change.

use std::{ops::RangeInclusive, sync::LazyLock};

use crate::{BsonValue, Value};

/// Integers in this range are interned for `Int32`, `Int64`, and `Double`.
pub const INTERNED_RANGE: RangeInclusive<i32> = -100..=100;

const LEN: usize = (*INTERNED_RANGE.end() - *INTERNED_RANGE.start() + 1) as usize;

struct Cache {
    int32: Vec<Value>,
    int64: Vec<Value>,
    double: Vec<Value>,
    null: Value,
    min_key: Value,
    max_key: Value,
    boolean: [Value; 2],
}

static CACHE: LazyLock<Cache> = LazyLock::new(|| {
    tracing::trace!(
        min = *INTERNED_RANGE.start(),
        max = *INTERNED_RANGE.end(),
        "building interned value table"
    );
    let mut int32 = Vec::with_capacity(LEN);
    let mut int64 = Vec::with_capacity(LEN);
    let mut double = Vec::with_capacity(LEN);
    for n in INTERNED_RANGE {
        int32.push(Value::allocate(BsonValue::Int32(n)));
        int64.push(Value::allocate(BsonValue::Int64(n as i64)));
        double.push(Value::allocate(BsonValue::Double(n as f64)));
    }
    Cache {
        int32,
        int64,
        double,
        null: Value::allocate(BsonValue::Null),
        min_key: Value::allocate(BsonValue::MinKey),
        max_key: Value::allocate(BsonValue::MaxKey),
        boolean: [
            Value::allocate(BsonValue::Boolean(false)),
            Value::allocate(BsonValue::Boolean(true)),
        ],
    }
});

#[inline]
fn slot(n: i64) -> Option<usize> {
    let start = *INTERNED_RANGE.start() as i64;
    let end = *INTERNED_RANGE.end() as i64;
    (start..=end).contains(&n).then(|| (n - start) as usize)
}

fn double_slot(value: f64) -> Option<usize> {
    // -0.0 is a distinct payload from 0.0 and is never interned.
    if value.fract() != 0.0 || (value == 0.0 && value.is_sign_negative()) {
        return None;
    }
    if value < *INTERNED_RANGE.start() as f64 || value > *INTERNED_RANGE.end() as f64 {
        return None;
    }
    slot(value as i64)
}

/// Returns the shared instance for `payload`, if it has one.
pub(crate) fn interned(payload: &BsonValue) -> Option<Value> {
    let cache = &*CACHE;
    let value = match *payload {
        BsonValue::Int32(n) => &cache.int32[slot(n as i64)?],
        BsonValue::Int64(n) => &cache.int64[slot(n)?],
        BsonValue::Double(n) => &cache.double[double_slot(n)?],
        BsonValue::Null => &cache.null,
        BsonValue::MinKey => &cache.min_key,
        BsonValue::MaxKey => &cache.max_key,
        BsonValue::Boolean(b) => &cache.boolean[b as usize],
        _ => return None,
    };
    Some(value.clone())
}

pub(crate) fn null() -> Value {
    CACHE.null.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_edges() {
        assert!(interned(&BsonValue::Int32(-100)).is_some());
        assert!(interned(&BsonValue::Int32(100)).is_some());
        assert!(interned(&BsonValue::Int32(101)).is_none());
        assert!(interned(&BsonValue::Int64(-101)).is_none());
        assert!(interned(&BsonValue::Double(2.5)).is_none());
        assert!(interned(&BsonValue::Double(-0.0)).is_none());
        assert!(interned(&BsonValue::Double(f64::NAN)).is_none());
        assert!(interned(&BsonValue::String("x".into())).is_none());
    }
}
