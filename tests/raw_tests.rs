use bytes::Bytes;
use na_bson::{
    Array, Binary, BinarySubtype, BsonValue, DateTime, Decimal128, Document, Error, Kind,
    ObjectId, RawArray, RawDocument, Regex, Timestamp, Value, doc,
};

// ==================== Helper Functions ====================

fn every_kind() -> Document {
    let mut doc = Document::new();
    doc.add("double", 1.25).unwrap();
    doc.add("string", "héllo").unwrap();
    doc.add("document", doc! { "inner" => 1, "deeper" => doc! { "x" => true } })
        .unwrap();
    doc.add("array", vec![Value::from(1), Value::from("two"), Value::from(vec![3])])
        .unwrap();
    doc.add("binary", Binary::new(BinarySubtype::Uuid, vec![7; 16]))
        .unwrap();
    doc.add("old_binary", Binary::new(BinarySubtype::BinaryOld, vec![1, 2, 3]))
        .unwrap();
    doc.add("oid", ObjectId::from_bytes([9; 12])).unwrap();
    doc.add("bool", false).unwrap();
    doc.add("date", DateTime::from_millis(1_700_000_000_000)).unwrap();
    doc.add("null", Value::null()).unwrap();
    doc.add("regex", Regex::new("^a.*z$", "mi")).unwrap();
    doc.add("code", BsonValue::JavaScript("f()".into())).unwrap();
    doc.add("symbol", BsonValue::Symbol("sym".into())).unwrap();
    doc.add(
        "scoped",
        BsonValue::JavaScriptWithScope {
            code: "g(x)".into(),
            scope: doc! { "x" => 5 },
        },
    )
    .unwrap();
    doc.add("int32", -42).unwrap();
    doc.add("timestamp", Timestamp::new(100, 7)).unwrap();
    doc.add("int64", i64::MIN).unwrap();
    doc.add("decimal", Decimal128::parse("12.345").unwrap()).unwrap();
    doc.add("min", Value::min_key()).unwrap();
    doc.add("max", Value::max_key()).unwrap();
    doc
}

fn expect_err(bytes: &[u8]) -> Error {
    match RawDocument::from_slice(bytes) {
        Ok(_) => panic!("Expected an error for {bytes:?}"),
        Err(e) => e,
    }
}

// ==================== Read parity ====================

#[test]
fn test_raw_read_parity() {
    let doc = every_kind();
    let bytes = doc.to_vec().unwrap();
    let raw = RawDocument::from_vec(bytes).unwrap();

    assert_eq!(raw.len(), doc.len());
    for (i, element) in doc.iter().enumerate() {
        assert_eq!(raw.name_at(i), Some(element.name()));
        assert_eq!(raw.kind_at(i), Some(element.value().kind()));
        assert_eq!(raw.value_at(i).as_ref(), Some(element.value()), "{}", element.name());
        assert_eq!(raw.get(element.name()).as_ref(), Some(element.value()));
    }

    let view = Document::from_raw(raw);
    assert_eq!(view, doc);
    assert_eq!(view.to_string(), doc.to_string());
}

#[test]
fn test_full_decode_matches() {
    let doc = every_kind();
    let bytes = doc.to_vec().unwrap();
    let decoded = Document::from_slice(&bytes).unwrap();
    assert_eq!(decoded, doc);
    assert!(!decoded.is_read_only());
    assert_eq!(decoded.to_vec().unwrap(), bytes);
}

#[test]
fn test_raw_reencodes_verbatim() {
    let doc = every_kind();
    let bytes = doc.to_vec().unwrap();
    let view = Document::from_raw(RawDocument::from_slice(&bytes).unwrap());
    assert_eq!(view.to_vec().unwrap(), bytes);

    // a raw nested document is copied byte for byte into a new encoding
    let mut outer = Document::new();
    outer.add("nested", view).unwrap();
    let reencoded = outer.to_vec().unwrap();
    assert_eq!(Document::from_slice(&reencoded).unwrap().get("nested").unwrap(), Value::from(doc));
}

#[test]
fn test_nested_views_share_the_buffer() {
    let doc = every_kind();
    let raw = RawDocument::from_vec(doc.to_vec().unwrap()).unwrap();

    let nested = raw.get("document").unwrap();
    let nested = nested.as_document().unwrap();
    assert!(nested.is_read_only());
    let nested_raw = nested.as_raw().unwrap();
    let outer = raw.as_bytes().as_ptr_range();
    assert!(outer.contains(&nested_raw.as_bytes().as_ptr()));

    let deeper = nested.get("deeper").unwrap();
    assert!(deeper.as_document().unwrap().is_read_only());
    assert_eq!(deeper.as_document().unwrap().get("x"), Some(Value::from(true)));

    let array = raw.get("array").unwrap();
    let array = array.as_array().unwrap();
    assert!(array.is_read_only());
    assert_eq!(array.len(), 3);
    assert_eq!(array.get(2), Some(Value::from(vec![3])));
}

#[test]
fn test_raw_array_reads() {
    let array: Array = [Value::from(1), Value::from("b"), Value::from(3.5)].into_iter().collect();
    let bytes = doc! { "a" => array.clone() }.to_vec().unwrap();
    let raw = RawDocument::from_vec(bytes).unwrap();
    let value = raw.get("a").unwrap();
    let view = value.as_array().unwrap();

    assert_eq!(view, &array);
    assert_eq!(view.index_of(&Value::from("b")), Some(1));
    assert_eq!(view.index_of_range(&Value::from(1), 1, 2).unwrap(), None);
    assert!(matches!(
        view.index_of_range(&Value::from(1), 2, 2),
        Err(Error::OutOfRange { .. })
    ));
    assert!(view.contains(&Value::from(3.5)));
    assert_eq!(view.to_values(), array.to_values());
}

#[test]
fn test_raw_array_from_bytes() {
    let bytes = doc! { "0" => 1, "1" => 2 }.to_vec().unwrap();
    let raw = RawArray::from_bytes(Bytes::from(bytes)).unwrap();
    assert_eq!(raw.len(), 2);
    assert_eq!(raw.to_array(), [1, 2].into_iter().collect::<Array>());
}

// ==================== Read-only ====================

#[test]
fn test_raw_document_is_read_only() {
    let mut view = Document::from_raw(RawDocument::from_vec(doc! { "a" => 1 }.to_vec().unwrap()).unwrap());
    assert!(view.is_read_only());

    assert!(matches!(view.add("b", 2), Err(Error::NotSupported(_))));
    assert!(matches!(view.set("a", 2), Err(Error::NotSupported(_))));
    assert!(matches!(view.remove("a"), Err(Error::NotSupported(_))));
    assert!(matches!(view.remove_at(0), Err(Error::NotSupported(_))));
    assert!(matches!(view.clear(), Err(Error::NotSupported(_))));
    assert!(matches!(view.get_mut("a"), Err(Error::NotSupported(_))));
    assert!(matches!(
        view.merge(&doc! { "c" => 3 }, true),
        Err(Error::NotSupported(_))
    ));
    assert_eq!(view, doc! { "a" => 1 });
}

#[test]
fn test_raw_array_is_read_only() {
    let raw = RawDocument::from_vec(doc! { "a" => vec![1, 2] }.to_vec().unwrap()).unwrap();
    let mut array = raw.get("a").unwrap().as_array().unwrap().clone();
    // a clone is an owned copy
    assert!(!array.is_read_only());
    array.push(3).unwrap();

    let value = raw.get("a").unwrap();
    let mut view = match value.into_inner() {
        BsonValue::Array(array) => array,
        other => panic!("Expected an array, got {other:?}"),
    };
    assert!(view.is_read_only());
    assert!(matches!(view.push(3), Err(Error::NotSupported(_))));
    assert!(matches!(view.insert(0, 3), Err(Error::NotSupported(_))));
    assert!(matches!(view.remove_at(0), Err(Error::NotSupported(_))));
    assert!(matches!(view.set_capacity(10), Err(Error::NotSupported(_))));
    assert_eq!(view.len(), 2);
}

#[test]
fn test_clone_of_raw_is_mutable() {
    let doc = doc! { "a" => 1, "b" => doc! { "c" => 2 } };
    let view = Document::from_raw(RawDocument::from_vec(doc.to_vec().unwrap()).unwrap());

    let mut shallow = view.clone();
    assert!(!shallow.is_read_only());
    shallow.add("d", 4).unwrap();
    assert_eq!(view.len(), 2);

    let deep = view.deep_clone();
    assert!(!deep.is_read_only());
    assert!(!deep.get("b").unwrap().as_document().unwrap().is_read_only());
    assert_eq!(deep, doc);
}

#[test]
fn test_clone_of_raw_owns_nested_values() {
    let doc = doc! { "b" => doc! { "c" => 2 }, "l" => vec![doc! { "d" => 3 }] };
    let view = Document::from_raw(RawDocument::from_vec(doc.to_vec().unwrap()).unwrap());

    let mut copy = view.clone();
    assert!(!copy.get("b").unwrap().as_document().unwrap().is_read_only());
    assert!(!copy.get("l").unwrap().as_array().unwrap().is_read_only());
    copy.get_mut("b")
        .unwrap()
        .unwrap()
        .as_document_mut()
        .unwrap()
        .set("c", 20)
        .unwrap();
    assert_eq!(copy.get("b").unwrap().as_document().unwrap().get("c"), Some(Value::from(20)));
    assert_eq!(view, doc);

    let array = view.get("l").unwrap().as_array().unwrap().clone();
    assert!(!array.get(0).unwrap().as_document().unwrap().is_read_only());
}

// ==================== Buffer lifetime ====================

#[test]
fn test_try_reclaim_after_clone_is_dropped() {
    let bytes = doc! { "a" => doc! { "b" => vec![1, 2] } }.to_vec().unwrap();
    let raw = RawDocument::from_vec(bytes).unwrap();

    let view = Document::from_raw(raw.clone());
    let copy = view.clone();
    let nested = copy.get("a").unwrap().as_document().unwrap().clone();
    drop(view);

    assert!(raw.try_reclaim().is_ok());
    assert_eq!(nested, doc! { "b" => vec![1, 2] });
    assert_eq!(copy.len(), 1);
}

#[test]
fn test_try_reclaim_when_unshared() {
    let bytes = doc! { "a" => 1 }.to_vec().unwrap();
    let raw = RawDocument::from_vec(bytes.clone()).unwrap();
    assert_eq!(raw.len(), 1);
    let buffer = raw.try_reclaim().unwrap();
    assert_eq!(&buffer[..], &bytes[..]);
}

#[test]
fn test_try_reclaim_fails_while_nested_view_alive() {
    let bytes = doc! { "a" => doc! { "b" => 1 } }.to_vec().unwrap();
    let raw = RawDocument::from_vec(bytes).unwrap();
    let nested = raw.get("a").unwrap();

    let raw = match raw.try_reclaim() {
        Ok(_) => panic!("Expected the buffer to be shared"),
        Err(raw) => raw,
    };
    assert_eq!(raw.get("a").unwrap(), nested);

    drop(nested);
    assert!(raw.try_reclaim().is_ok());
}

#[test]
fn test_raw_clone_shares_buffer() {
    let raw = RawDocument::from_vec(doc! { "a" => 1 }.to_vec().unwrap()).unwrap();
    let copy = raw.clone();
    assert_eq!(copy.as_bytes().as_ptr(), raw.as_bytes().as_ptr());
    assert!(raw.try_reclaim().is_err());
    assert!(copy.try_reclaim().is_ok());
}

// ==================== Malformed input ====================

#[test]
fn test_empty_input() {
    match expect_err(&[]) {
        Error::EndOfFile => {}
        e => panic!("Expected EndOfFile, got {e:?}"),
    }
}

#[test]
fn test_declared_length_past_end() {
    match expect_err(&[10, 0, 0, 0, 0]) {
        Error::EndOfFile => {}
        e => panic!("Expected EndOfFile, got {e:?}"),
    }
}

#[test]
fn test_length_too_small() {
    match expect_err(&[3, 0, 0, 0, 0]) {
        Error::InvalidLength(3) => {}
        e => panic!("Expected InvalidLength, got {e:?}"),
    }
}

#[test]
fn test_trailing_data() {
    match expect_err(&[5, 0, 0, 0, 0, 0xAA]) {
        Error::TrailingData(1) => {}
        e => panic!("Expected TrailingData, got {e:?}"),
    }
}

#[test]
fn test_invalid_type_byte() {
    match expect_err(&[8, 0, 0, 0, 0x42, b'a', 0, 0]) {
        Error::InvalidKind(0x42) => {}
        e => panic!("Expected InvalidKind, got {e:?}"),
    }
}

#[test]
fn test_invalid_utf8_name() {
    match expect_err(&[8, 0, 0, 0, 0x0A, 0xFF, 0, 0]) {
        Error::InvalidUtf8 => {}
        e => panic!("Expected InvalidUtf8, got {e:?}"),
    }
}

#[test]
fn test_invalid_utf8_string() {
    // {"s": <1 invalid byte>}
    let data = [14, 0, 0, 0, 0x02, b's', 0, 2, 0, 0, 0, 0xFF, 0, 0];
    match expect_err(&data) {
        Error::InvalidUtf8 => {}
        e => panic!("Expected InvalidUtf8, got {e:?}"),
    }
}

#[test]
fn test_missing_terminator() {
    match expect_err(&[5, 0, 0, 0, 1]) {
        Error::Malformed(_) => {}
        e => panic!("Expected Malformed, got {e:?}"),
    }
}

#[test]
fn test_bad_boolean_byte() {
    let data = [9, 0, 0, 0, 0x08, b'b', 0, 2, 0];
    match expect_err(&data) {
        Error::Malformed(_) => {}
        e => panic!("Expected Malformed, got {e:?}"),
    }
}

#[test]
fn test_nested_length_mismatch() {
    // the inner document claims 6 bytes but ends after 5
    let data = [13, 0, 0, 0, 0x03, b'd', 0, 6, 0, 0, 0, 0, 0];
    assert!(RawDocument::from_slice(&data).is_err());
}

#[test]
fn test_deep_invalid_utf8_rejected_up_front() {
    let mut bytes = doc! { "a" => doc! { "b" => vec!["x"] } }.to_vec().unwrap();
    let at = bytes.iter().rposition(|&b| b == b'x').unwrap();
    bytes[at] = 0xFF;
    match expect_err(&bytes) {
        Error::InvalidUtf8 => {}
        e => panic!("Expected InvalidUtf8, got {e:?}"),
    }
}

#[test]
fn test_excessive_nesting() {
    let mut doc = Document::new();
    for _ in 0..200 {
        let mut outer = Document::new();
        outer.add("n", doc).unwrap();
        doc = outer;
    }
    let bytes = doc.to_vec().unwrap();
    match expect_err(&bytes) {
        Error::Malformed(_) => {}
        e => panic!("Expected Malformed, got {e:?}"),
    }
}

#[test]
fn test_static_bytes() {
    static EMPTY: [u8; 5] = [5, 0, 0, 0, 0];
    let raw = RawDocument::from_static(&EMPTY).unwrap();
    assert!(raw.is_empty());
    assert_eq!(raw.len(), 0);
    assert_eq!(Value::from(Document::from_raw(raw)).kind(), Kind::Document);
}
