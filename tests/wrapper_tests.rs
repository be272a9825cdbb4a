use na_bson::{BsonWriter, Document, DocumentSerializer, Error, Result, Value, doc};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

// ==================== Helpers ====================

struct Point {
    x: i32,
    y: i32,
}

/// Writes a `Point` and counts how often it ran.
#[derive(Default)]
struct CountingSerializer {
    calls: AtomicUsize,
}

impl CountingSerializer {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentSerializer<Point> for CountingSerializer {
    fn serialize(&self, writer: &mut dyn BsonWriter, point: &Point) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        writer.write_start_document()?;
        writer.write_name("x")?;
        writer.write_int32(point.x)?;
        writer.write_name("y")?;
        writer.write_int32(point.y)?;
        writer.write_end_document()
    }
}

struct FailingSerializer;

impl DocumentSerializer<Point> for FailingSerializer {
    fn serialize(&self, writer: &mut dyn BsonWriter, _: &Point) -> Result<()> {
        writer.write_start_document()?;
        writer.write_int32(1)
    }
}

fn wrapped_point() -> (Document, Arc<CountingSerializer>) {
    let serializer = Arc::new(CountingSerializer::default());
    let doc = Document::wrap_with(Some(Arc::new(Point { x: 1, y: 2 })), Arc::clone(&serializer));
    (doc, serializer)
}

// ==================== Laziness ====================

#[test]
fn test_wrapper_starts_unmaterialized() {
    let (doc, serializer) = wrapped_point();
    assert!(doc.is_wrapper());
    assert!(!doc.is_materialized());
    assert_eq!(serializer.calls(), 0);
}

#[test]
fn test_display_does_not_materialize() {
    let (doc, serializer) = wrapped_point();
    assert_eq!(doc.to_string(), r#"{"x":1,"y":2}"#);
    assert!(!doc.is_materialized());
    assert_eq!(serializer.calls(), 1);
}

#[test]
fn test_encoding_does_not_materialize() {
    let (doc, _) = wrapped_point();
    let bytes = doc.to_vec().unwrap();
    assert!(!doc.is_materialized());
    assert_eq!(Document::from_slice(&bytes).unwrap(), doc! { "x" => 1, "y" => 2 });
}

#[test]
fn test_len_materializes_once() {
    let (doc, serializer) = wrapped_point();
    assert_eq!(doc.len(), 2);
    assert!(doc.is_materialized());
    assert_eq!(serializer.calls(), 1);

    assert_eq!(doc.get("y"), Some(Value::from(2)));
    assert_eq!(doc.to_string(), r#"{"x":1,"y":2}"#);
    assert_eq!(serializer.calls(), 1);
}

#[test]
fn test_equality_materializes() {
    let (doc, _) = wrapped_point();
    assert_eq!(doc, doc! { "x" => 1, "y" => 2 });
    assert!(doc.is_materialized());
}

#[test]
fn test_mutation_after_materialization() {
    let (mut doc, serializer) = wrapped_point();
    doc.add("z", 3).unwrap();
    assert_eq!(serializer.calls(), 1);
    assert_eq!(doc.len(), 3);
    assert!(doc.wrapped::<Point>().is_some());
}

// ==================== Cloning ====================

#[test]
fn test_clone_of_unmaterialized_stays_lazy() {
    let (doc, serializer) = wrapped_point();
    let copy = doc.clone();
    assert!(!copy.is_materialized());
    assert!(copy.is_wrapper());

    assert_eq!(copy.len(), 2);
    assert!(copy.is_materialized());
    assert!(!doc.is_materialized());
    assert_eq!(serializer.calls(), 1);

    assert_eq!(doc.len(), 2);
    assert_eq!(serializer.calls(), 2);
}

#[test]
fn test_clone_of_materialized_is_plain() {
    let (doc, serializer) = wrapped_point();
    doc.try_materialize().unwrap();
    let copy = doc.clone();
    assert!(copy.is_materialized());
    assert!(!copy.is_wrapper());
    assert_eq!(copy, doc);
    assert_eq!(serializer.calls(), 1);
}

// ==================== Wrapped object ====================

#[test]
fn test_none_materializes_empty() {
    let serializer = Arc::new(CountingSerializer::default());
    let doc = Document::wrap_with(None::<Arc<Point>>, Arc::clone(&serializer));
    assert_eq!(doc.to_string(), "{}");
    assert!(doc.is_empty());
    assert_eq!(serializer.calls(), 0);
    assert!(doc.wrapped::<Point>().is_none());
}

#[test]
fn test_wrapped_downcast() {
    let (doc, _) = wrapped_point();
    let point = doc.wrapped::<Point>().unwrap();
    assert_eq!((point.x, point.y), (1, 2));
    assert!(doc.wrapped::<String>().is_none());
    assert!(Document::new().wrapped::<Point>().is_none());
}

// ==================== Failure ====================

#[test]
fn test_try_materialize_reports_serializer_error() {
    let doc = Document::wrap_with(Some(Arc::new(Point { x: 0, y: 0 })), Arc::new(FailingSerializer));
    match doc.try_materialize() {
        Err(Error::InvalidState(_)) => {}
        other => panic!("Expected InvalidState, got {other:?}"),
    }
    assert!(!doc.is_materialized());
}

#[test]
#[should_panic(expected = "failed to materialize")]
fn test_implicit_materialization_panics_on_error() {
    let doc = Document::wrap_with(Some(Arc::new(Point { x: 0, y: 0 })), Arc::new(FailingSerializer));
    let _ = doc.len();
}

// ==================== Serde ====================

#[cfg(feature = "serde")]
mod serde_wrapper {
    use na_bson::{Document, Kind, Value};

    #[derive(serde::Serialize)]
    struct User {
        name: String,
        age: u8,
        tags: Vec<String>,
    }

    #[test]
    fn test_serde_wrapper() {
        let doc = Document::wrap(Some(User {
            name: "ada".into(),
            age: 36,
            tags: vec!["math".into()],
        }));
        assert_eq!(doc.to_string(), r#"{"name":"ada","age":36,"tags":["math"]}"#);
        assert!(!doc.is_materialized());

        assert_eq!(doc.get("age").unwrap().kind(), Kind::Int32);
        assert_eq!(doc.get("name"), Some(Value::from("ada")));
        assert!(doc.is_materialized());
        assert_eq!(doc.wrapped::<User>().unwrap().age, 36);
    }

    #[test]
    fn test_serde_wrapper_of_scalar_fails_to_materialize() {
        let doc = Document::wrap(Some(5i32));
        assert!(matches!(
            doc.try_materialize(),
            Err(na_bson::Error::TopLevelNotDocument(Kind::Int32))
        ));
        assert!(!doc.is_materialized());
    }

    #[test]
    #[should_panic(expected = "failed to materialize")]
    fn test_serde_wrapper_of_scalar_panics_on_len() {
        let _ = Document::wrap(Some(5i32)).len();
    }

    #[test]
    fn test_serde_wrapper_none() {
        let doc = Document::wrap(None::<User>);
        assert!(doc.is_empty());
    }
}
