use na_bson::{
    Binary, BinaryWriter, BsonValue, BsonWriter, DateTime, Decimal128, Document, Error,
    JsonOutputMode, JsonWriter, JsonWriterSettings, Kind, ObjectId, Regex, Timestamp, Value,
    ValueBuilder, doc, extjson, write_document,
};

// ==================== Helper Functions ====================

fn sample() -> Document {
    let mut doc = Document::new();
    doc.add("i32", 7).unwrap();
    doc.add("i64", 5_000_000_000i64).unwrap();
    doc.add("small_i64", 3i64).unwrap();
    doc.add("double", 2.5).unwrap();
    doc.add("whole", 4.0).unwrap();
    doc.add("inf", f64::NEG_INFINITY).unwrap();
    doc.add("decimal", Decimal128::parse("-1.50").unwrap()).unwrap();
    doc.add("text", "tab\there").unwrap();
    doc.add("symbol", BsonValue::Symbol("sym".into())).unwrap();
    doc.add("nested", doc! { "list" => vec![Value::from(true), Value::null()] })
        .unwrap();
    doc.add("binary", Binary::generic(b"hello".to_vec())).unwrap();
    doc.add("oid", ObjectId::from_bytes([0x5F; 12])).unwrap();
    doc.add("date", DateTime::from_millis(86_400_000)).unwrap();
    doc.add("old_date", DateTime::from_millis(-1)).unwrap();
    doc.add("regex", Regex::new("^x", "i")).unwrap();
    doc.add("code", BsonValue::JavaScript("f()".into())).unwrap();
    doc.add(
        "scoped",
        BsonValue::JavaScriptWithScope {
            code: "g()".into(),
            scope: doc! { "k" => 1 },
        },
    )
    .unwrap();
    doc.add("ts", Timestamp::new(10, 20)).unwrap();
    doc.add("min", Value::min_key()).unwrap();
    doc.add("max", Value::max_key()).unwrap();
    doc
}

fn assert_same_kinds(a: &Document, b: &Document) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.name(), y.name());
        assert_eq!(x.value().kind(), y.value().kind(), "kind of {}", x.name());
        assert_eq!(x.value(), y.value(), "value of {}", x.name());
    }
}

// ==================== Binary layout ====================

#[test]
fn test_empty_document_bytes() {
    assert_eq!(Document::new().to_vec().unwrap(), [5, 0, 0, 0, 0]);
}

#[test]
fn test_nested_document_bytes() {
    let bytes = doc! { "d" => doc! { "b" => true } }.to_vec().unwrap();
    assert_eq!(
        bytes,
        [
            17, 0, 0, 0, // outer length
            0x03, b'd', 0, // document "d"
            9, 0, 0, 0, // inner length
            0x08, b'b', 0, 1, // boolean "b"
            0, // inner terminator
            0, // outer terminator
        ]
    );
}

#[test]
fn test_array_uses_index_names() {
    let bytes = doc! { "a" => vec!["x"] }.to_vec().unwrap();
    assert_eq!(
        bytes,
        [
            20, 0, 0, 0, //
            0x04, b'a', 0, //
            13, 0, 0, 0, //
            0x02, b'0', 0, 2, 0, 0, 0, b'x', 0, //
            0, //
            0,
        ]
    );
}

#[test]
fn test_write_to() {
    let doc = doc! { "a" => 1 };
    let mut out = Vec::new();
    doc.write_to(&mut out).unwrap();
    assert_eq!(out, doc.to_vec().unwrap());
}

// ==================== Call order ====================

#[test]
fn test_top_level_must_be_document() {
    let mut writer = BinaryWriter::new();
    match writer.write_int32(1) {
        Err(Error::TopLevelNotDocument(Kind::Int32)) => {}
        other => panic!("Expected TopLevelNotDocument, got {other:?}"),
    }
}

#[test]
fn test_value_needs_name() {
    let mut writer = BinaryWriter::new();
    writer.write_start_document().unwrap();
    assert!(matches!(writer.write_int32(1), Err(Error::InvalidState(_))));
}

#[test]
fn test_name_outside_document() {
    let mut writer = BinaryWriter::new();
    assert!(matches!(writer.write_name("a"), Err(Error::InvalidState(_))));

    writer.write_start_document().unwrap();
    writer.write_name("list").unwrap();
    writer.write_start_array().unwrap();
    assert!(matches!(writer.write_name("0"), Err(Error::InvalidState(_))));
}

#[test]
fn test_double_name() {
    let mut writer = BinaryWriter::new();
    writer.write_start_document().unwrap();
    writer.write_name("a").unwrap();
    assert!(matches!(writer.write_name("b"), Err(Error::InvalidState(_))));
}

#[test]
fn test_mismatched_end() {
    let mut writer = BinaryWriter::new();
    writer.write_start_document().unwrap();
    assert!(matches!(writer.write_end_array(), Err(Error::InvalidState(_))));

    writer.write_name("a").unwrap();
    assert!(matches!(writer.write_end_document(), Err(Error::InvalidState(_))));
}

#[test]
fn test_incomplete_output() {
    let mut writer = BinaryWriter::new();
    writer.write_start_document().unwrap();
    assert!(matches!(writer.into_bytes(), Err(Error::InvalidState(_))));
    assert!(matches!(BinaryWriter::new().into_bytes(), Err(Error::InvalidState(_))));
}

#[test]
fn test_second_top_level_document() {
    let mut writer = BinaryWriter::new();
    writer.write_start_document().unwrap();
    writer.write_end_document().unwrap();
    assert!(matches!(writer.write_start_document(), Err(Error::InvalidState(_))));
}

#[test]
fn test_nul_in_name() {
    let mut doc = Document::new();
    doc.add("a\0b", 1).unwrap();
    assert!(matches!(doc.to_vec(), Err(Error::Malformed(_))));
}

#[test]
fn test_scope_must_be_document() {
    let mut writer = BinaryWriter::new();
    writer.write_start_document().unwrap();
    writer.write_name("f").unwrap();
    writer.write_javascript_with_scope("x").unwrap();
    assert!(matches!(writer.write_int32(1), Err(Error::InvalidState(_))));
}

// ==================== Builder ====================

#[test]
fn test_builder_any_value() {
    let mut builder = ValueBuilder::for_value();
    builder.write_start_array().unwrap();
    builder.write_int32(1).unwrap();
    builder.write_start_document().unwrap();
    builder.write_end_document().unwrap();
    builder.write_end_array().unwrap();
    let value = builder.into_value().unwrap();
    assert_eq!(value, Value::from(vec![Value::from(1), Value::from(Document::new())]));
}

#[test]
fn test_builder_scalar_root() {
    let mut builder = ValueBuilder::for_value();
    builder.write_string("x").unwrap();
    assert!(matches!(builder.write_string("y"), Err(Error::InvalidState(_))));
    assert_eq!(builder.into_value().unwrap(), Value::from("x"));
}

#[test]
fn test_builder_code_with_scope() {
    let mut builder = ValueBuilder::new();
    builder.write_start_document().unwrap();
    builder.write_name("f").unwrap();
    builder.write_javascript_with_scope("g()").unwrap();
    builder.write_start_document().unwrap();
    builder.write_name("k").unwrap();
    builder.write_int32(1).unwrap();
    builder.write_end_document().unwrap();
    builder.write_end_document().unwrap();
    let doc = builder.into_document().unwrap();
    assert_eq!(
        doc.get("f").unwrap(),
        Value::new(BsonValue::JavaScriptWithScope {
            code: "g()".into(),
            scope: doc! { "k" => 1 },
        })
    );
}

#[test]
fn test_write_document_into_builder() {
    let doc = sample();
    let mut builder = ValueBuilder::new();
    write_document(&mut builder, &doc).unwrap();
    assert_same_kinds(&builder.into_document().unwrap(), &doc);
}

// ==================== Extended JSON ====================

#[test]
fn test_relaxed_rendering() {
    let doc = doc! {
        "n" => 1,
        "l" => 2i64,
        "d" => 1.0,
        "s" => "x",
        "b" => false,
        "a" => vec![1, 2],
        "e" => Document::new(),
    };
    assert_eq!(
        doc.to_json(),
        r#"{"n":1,"l":2,"d":1.0,"s":"x","b":false,"a":[1,2],"e":{}}"#
    );
}

#[test]
fn test_canonical_rendering() {
    let doc = doc! { "n" => 1, "l" => 2i64, "d" => 1.5, "date" => DateTime::from_millis(0) };
    assert_eq!(
        doc.to_json_with(JsonWriterSettings::canonical()).unwrap(),
        concat!(
            r#"{"n":{"$numberInt":"1"},"l":{"$numberLong":"2"},"#,
            r#""d":{"$numberDouble":"1.5"},"date":{"$date":{"$numberLong":"0"}}}"#
        )
    );
}

#[test]
fn test_wrapper_forms() {
    let doc = doc! {
        "oid" => ObjectId::from_bytes([0x5F; 12]),
        "bin" => Binary::generic(b"hi".to_vec()),
        "date" => DateTime::from_millis(0),
        "old" => DateTime::from_millis(-1),
        "ts" => Timestamp::new(1, 2),
        "re" => Regex::new("a", ""),
        "nan" => f64::NAN,
        "min" => Value::min_key(),
    };
    assert_eq!(
        doc.to_json(),
        concat!(
            r#"{"oid":{"$oid":"5f5f5f5f5f5f5f5f5f5f5f5f"},"#,
            r#""bin":{"$binary":{"base64":"aGk=","subType":"00"}},"#,
            r#""date":{"$date":"1970-01-01T00:00:00.000Z"},"#,
            r#""old":{"$date":{"$numberLong":"-1"}},"#,
            r#""ts":{"$timestamp":{"t":1,"i":2}},"#,
            r#""re":{"$regularExpression":{"pattern":"a","options":""}},"#,
            r#""nan":{"$numberDouble":"NaN"},"#,
            r#""min":{"$minKey":1}}"#
        )
    );
}

#[test]
fn test_code_with_scope_rendering() {
    let doc = doc! {
        "f" => BsonValue::JavaScriptWithScope { code: "g()".into(), scope: doc! { "k" => 1 } },
    };
    assert_eq!(doc.to_json(), r#"{"f":{"$code":"g()","$scope":{"k":1}}}"#);
}

#[test]
fn test_indented_rendering() {
    let doc = doc! { "a" => 1, "b" => vec![1, 2] };
    let settings = JsonWriterSettings::relaxed().with_indent(true);
    assert_eq!(
        doc.to_json_with(settings).unwrap(),
        "{\n  \"a\": 1,\n  \"b\": [\n    1,\n    2\n  ]\n}"
    );
}

#[test]
fn test_json_writer_directly() {
    let mut writer = JsonWriter::new(JsonWriterSettings {
        mode: JsonOutputMode::Canonical,
        indent: false,
    });
    writer.write_start_document().unwrap();
    writer.write_name("x").unwrap();
    writer.write_int64(9).unwrap();
    writer.write_end_document().unwrap();
    assert_eq!(writer.into_string().unwrap(), r#"{"x":{"$numberLong":"9"}}"#);
}

#[test]
fn test_canonical_round_trip_keeps_kinds() {
    let doc = sample();
    let json = doc.to_json_with(JsonWriterSettings::canonical()).unwrap();
    let parsed = Document::from_extended_json(&json).unwrap();
    assert_same_kinds(&parsed, &doc);
}

#[test]
fn test_relaxed_round_trip_is_equal() {
    let doc = sample();
    let parsed = extjson::document_from_str(&doc.to_json()).unwrap();
    assert_eq!(parsed, doc);
    assert_eq!(parsed.get("small_i64").unwrap().kind(), Kind::Int32);
    assert_eq!(parsed.get("i64").unwrap().kind(), Kind::Int64);
    assert_eq!(parsed.get("whole").unwrap().kind(), Kind::Double);
}

#[test]
fn test_parse_plain_json() {
    let value = extjson::from_str(r#"[1, 2.5, "x", null, {"$gt": 3}]"#).unwrap();
    let array = value.as_array().unwrap();
    assert_eq!(array.get(0).unwrap().kind(), Kind::Int32);
    assert_eq!(array.get(1).unwrap().kind(), Kind::Double);
    assert_eq!(array.get(3), Some(Value::null()));
    // operator keys are ordinary names
    assert_eq!(array.get(4), Some(Value::from(doc! { "$gt" => 3 })));
}

#[test]
fn test_parse_date_forms() {
    let doc = extjson::document_from_str(
        r#"{"a":{"$date":"1970-01-02T00:00:00Z"},"b":{"$date":{"$numberLong":"86400000"}},"c":{"$date":86400000}}"#,
    )
    .unwrap();
    let expected = Value::from(DateTime::from_millis(86_400_000));
    assert_eq!(doc.get("a"), Some(expected.clone()));
    assert_eq!(doc.get("b"), Some(expected.clone()));
    assert_eq!(doc.get("c"), Some(expected));
}

#[test]
fn test_parse_errors() {
    assert!(matches!(extjson::from_str("{"), Err(Error::Format(_))));
    assert!(matches!(
        extjson::from_str(r#"{"$oid":"zz"}"#),
        Err(Error::Format(_))
    ));
    assert!(matches!(
        extjson::from_str(r#"{"$numberInt":"1.5"}"#),
        Err(Error::Format(_))
    ));
    assert!(matches!(
        extjson::from_str(r#"{"$binary":{"base64":"!!","subType":"00"}}"#),
        Err(Error::Format(_))
    ));
    assert!(matches!(
        extjson::from_str(r#"{"$timestamp":{"t":1}}"#),
        Err(Error::Format(_))
    ));
    assert!(matches!(
        extjson::document_from_str("[1]"),
        Err(Error::TopLevelNotDocument(Kind::Array))
    ));
}

#[test]
fn test_equal_documents_render_identically() {
    let a = doc! { "x" => 1, "y" => vec!["a"] };
    let bytes = a.to_vec().unwrap();
    let b = Document::from_slice(&bytes).unwrap();
    assert_eq!(a.to_json(), b.to_json());
    assert_eq!(
        a.to_json_with(JsonWriterSettings::canonical()).unwrap(),
        b.to_json_with(JsonWriterSettings::canonical()).unwrap()
    );
}
