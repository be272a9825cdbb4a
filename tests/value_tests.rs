use na_bson::{
    Binary, BsonValue, DateTime, Decimal128, Document, Error, INTERNED_RANGE, Kind, ObjectId,
    Regex, Timestamp, Value, doc,
};
use std::{
    cmp::Ordering,
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

fn hash_of(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

// ==================== Cross-kind numeric equality ====================

#[test]
fn test_numeric_equality_across_kinds() {
    for n in [-1000i32, -101, -1, 0, 1, 7, 100, 1000, i32::MAX] {
        let a = Value::from(n);
        let b = Value::from(n as i64);
        let c = Value::from(n as f64);
        let d = Value::from(Decimal128::from_i32(n));
        assert_eq!(a, b, "Int32 vs Int64 for {n}");
        assert_eq!(b, c, "Int64 vs Double for {n}");
        assert_eq!(a, c, "Int32 vs Double for {n}");
        assert_eq!(a, d, "Int32 vs Decimal128 for {n}");
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(hash_of(&a), hash_of(&c));
        assert_eq!(hash_of(&a), hash_of(&d));
    }
}

#[test]
fn test_relational_operators_match_native() {
    let samples = [-3i64, -1, 0, 2, 5];
    for x in samples {
        for y in samples {
            let a = Value::from(x);
            let b = Value::from(y as f64);
            assert_eq!(a < b, x < y);
            assert_eq!(a <= b, x <= y);
            assert_eq!(a > b, x > y);
            assert_eq!(a >= b, x >= y);
            assert_eq!(a == b, x == y);
            assert_eq!(a != b, x != y);
        }
    }
}

#[test]
fn test_fractional_double_vs_integer() {
    assert!(Value::from(1) < Value::from(1.5));
    assert!(Value::from(2i64) > Value::from(1.5));
    assert_ne!(Value::from(1), Value::from(1.5));
}

#[test]
fn test_large_integer_vs_double_is_exact() {
    // 2^63 is not representable as i64; i64::MAX must sort below it.
    let max = Value::from(i64::MAX);
    let two_pow_63 = Value::from(9_223_372_036_854_775_808.0);
    assert!(max < two_pow_63);

    // 2^53 + 1 rounds to 2^53 as a double, so the integer is greater.
    let big = Value::from(9_007_199_254_740_993i64);
    let rounded = Value::from(9_007_199_254_740_992.0);
    assert!(big > rounded);
    assert_ne!(big, rounded);
}

#[test]
fn test_decimal_compares_exactly() {
    let tenth = Value::from(Decimal128::parse("0.1").unwrap());
    // 0.1 as a double is slightly above one tenth.
    assert!(tenth < Value::from(0.1));
    let half = Value::from(Decimal128::parse("0.5").unwrap());
    assert_eq!(half, Value::from(0.5));
}

#[test]
fn test_nan_and_zero() {
    let nan = Value::from(f64::NAN);
    assert_eq!(nan, Value::from(f64::NAN));
    assert!(nan < Value::from(f64::NEG_INFINITY));
    assert_eq!(Value::from(-0.0), Value::from(0.0));
    assert_eq!(hash_of(&Value::from(-0.0)), hash_of(&Value::from(0)));
}

// ==================== Total order ====================

fn one_of_each() -> Vec<Value> {
    vec![
        Value::min_key(),
        Value::null(),
        Value::from(3),
        Value::from(BsonValue::Symbol("s".into())),
        Value::from("text"),
        Value::from(doc! { "a" => 1 }),
        Value::from(vec![1, 2]),
        Value::from(Binary::generic(vec![1, 2, 3])),
        Value::from(ObjectId::from_bytes([1; 12])),
        Value::from(true),
        Value::from(DateTime::from_millis(0)),
        Value::from(Timestamp::new(1, 2)),
        Value::from(Regex::new("^a", "i")),
        Value::from(BsonValue::JavaScript("f()".into())),
        Value::new(BsonValue::JavaScriptWithScope {
            code: "g()".into(),
            scope: Document::new(),
        }),
        Value::max_key(),
    ]
}

#[test]
fn test_kind_order_is_total() {
    let values = one_of_each();
    for (i, a) in values.iter().enumerate() {
        assert_eq!(a.compare_to(Some(a)), Ordering::Equal);
        for (j, b) in values.iter().enumerate() {
            assert_eq!(a.compare_type_to(Some(b)), i.cmp(&j), "{a:?} vs {b:?}");
            assert_eq!(a.cmp(b), b.cmp(a).reverse());
        }
    }
}

#[test]
fn test_order_is_transitive_across_kinds() {
    let mut values = one_of_each();
    values.extend([Value::from(2.5), Value::from(-7i64), Value::from("aaa")]);
    for a in &values {
        for b in &values {
            for c in &values {
                if a <= b && b <= c {
                    assert!(a <= c, "{a:?} <= {b:?} <= {c:?}");
                }
            }
        }
    }
}

#[test]
fn test_min_and_max_key_bound_everything() {
    for value in one_of_each() {
        assert!(Value::min_key() <= value);
        assert!(Value::max_key() >= value);
    }
}

// ==================== Absent references ====================

#[test]
fn test_absent_reference_rules() {
    let none: Option<Value> = None;
    let other: Option<Value> = None;
    assert!(!(none < other));
    assert!(none <= other);
    assert!(none == other);
    assert!(none >= other);
    assert!(!(none > other));
    assert!(!(none != other));

    let present = Some(Value::null());
    assert!(present > none);
    assert_eq!(Value::null().compare_type_to(None), Ordering::Greater);
    assert_eq!(Value::min_key().compare_to(None), Ordering::Greater);
}

// ==================== Interning ====================

#[test]
fn test_small_numbers_are_interned() {
    assert!(Value::ptr_eq(&Value::from(50), &Value::from(50)));
    assert!(Value::ptr_eq(&Value::from(-100i64), &Value::from(-100i64)));
    assert!(Value::ptr_eq(&Value::from(100.0), &Value::from(100.0)));
    assert!(Value::ptr_eq(&Value::from(true), &Value::from(true)));
    assert!(Value::ptr_eq(&Value::null(), &Value::new(BsonValue::Null)));
}

#[test]
fn test_large_numbers_are_not_interned() {
    let a = Value::from(1000);
    let b = Value::from(1000);
    assert_eq!(a, b);
    assert!(!Value::ptr_eq(&a, &b));

    let outside = *INTERNED_RANGE.end() + 1;
    assert!(!Value::ptr_eq(&Value::from(outside), &Value::from(outside)));
    assert!(!Value::ptr_eq(&Value::from(2.5), &Value::from(2.5)));
    assert!(!Value::ptr_eq(&Value::from(-0.0), &Value::from(-0.0)));
}

#[test]
fn test_interned_kinds_stay_distinct() {
    let int32 = Value::from(5);
    let int64 = Value::from(5i64);
    assert_eq!(int32, int64);
    assert!(!Value::ptr_eq(&int32, &int64));
    assert_eq!(int32.kind(), Kind::Int32);
    assert_eq!(int64.kind(), Kind::Int64);
}

#[test]
fn test_make_mut_does_not_touch_singletons() {
    let mut value = Value::from(7);
    if let BsonValue::Int32(n) = value.make_mut() {
        *n = 8;
    }
    assert_eq!(value, Value::from(8));
    assert_eq!(Value::from(7).as_i32(), Some(7));
}

// ==================== Conversions ====================

#[test]
fn test_double_rounds_half_away_from_zero() {
    assert_eq!(Value::from(1.5).to_int32().unwrap(), 2);
    assert_eq!(Value::from(2.5).to_int32().unwrap(), 3);
    assert_eq!(Value::from(-1.5).to_int64().unwrap(), -2);
    assert_eq!(Value::from(1.4).to_int32().unwrap(), 1);
}

#[test]
fn test_boolean_to_number() {
    assert_eq!(Value::from(true).to_int32().unwrap(), 1);
    assert_eq!(Value::from(false).to_double().unwrap(), 0.0);
}

#[test]
fn test_string_parsing() {
    assert_eq!(Value::from("42").to_int64().unwrap(), 42);
    assert_eq!(Value::from("2.5").to_double().unwrap(), 2.5);
    assert!(Value::from("TRUE").to_boolean().unwrap());
    assert_eq!(
        Value::from("1970-01-01T00:00:01Z").to_date_time().unwrap(),
        DateTime::from_millis(1000)
    );

    match Value::from("forty-two").to_int32() {
        Err(Error::Format(_)) => {}
        other => panic!("Expected Format, got {other:?}"),
    }
    match Value::from("yes").to_boolean() {
        Err(Error::Format(_)) => {}
        other => panic!("Expected Format, got {other:?}"),
    }
    match Value::from("1.5e-9223372036854775808").to_decimal128() {
        Err(Error::Format(_)) => {}
        other => panic!("Expected Format, got {other:?}"),
    }
    assert!(matches!(
        na_bson::extjson::from_str(r#"{"$numberDecimal":"1.5e-9223372036854775808"}"#),
        Err(Error::Format(_))
    ));
}

#[test]
fn test_invalid_cast() {
    match Value::from(Document::new()).to_boolean() {
        Err(Error::InvalidCast { from, .. }) => assert_eq!(from, Kind::Document),
        other => panic!("Expected InvalidCast, got {other:?}"),
    }
    match Value::null().to_int32() {
        Err(Error::InvalidCast { from, .. }) => assert_eq!(from, Kind::Null),
        other => panic!("Expected InvalidCast, got {other:?}"),
    }
}

#[test]
fn test_overflow() {
    match Value::from(i64::MAX).to_int32() {
        Err(Error::Overflow { .. }) => {}
        other => panic!("Expected Overflow, got {other:?}"),
    }
    match Value::from(-1).convert::<u32>() {
        Err(Error::Overflow { .. }) => {}
        other => panic!("Expected Overflow, got {other:?}"),
    }
    match Value::from(f64::INFINITY).to_int64() {
        Err(Error::Overflow { .. }) => {}
        other => panic!("Expected Overflow, got {other:?}"),
    }
}

#[test]
fn test_option_conversion() {
    assert_eq!(Value::null().convert::<Option<i32>>().unwrap(), None);
    assert_eq!(Value::from(3).convert::<Option<i32>>().unwrap(), Some(3));
}

#[test]
fn test_host_string() {
    assert_eq!(Value::from(12).to_host_string().unwrap(), "12");
    assert_eq!(
        Value::from(ObjectId::from_bytes([0xAB; 12]))
            .to_host_string()
            .unwrap(),
        "abababababababababababab"
    );
}

// ==================== Display ====================

#[test]
fn test_value_display_is_relaxed_json() {
    assert_eq!(Value::from(1).to_string(), "1");
    assert_eq!(Value::from("a\"b").to_string(), r#""a\"b""#);
    assert_eq!(Value::from(vec![1, 2]).to_string(), "[1,2]");
    assert_eq!(Value::null().to_json(), "null");
}
