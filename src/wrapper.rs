//! Documents backed by a host object that is serialized on first use.
//!
//! A wrapped document starts out unmaterialized: it holds only the host
//! object and the serializer that turns it into elements. The first
//! operation that needs the elements runs the serializer once and keeps the
//! result. From then on the document behaves like any owned document. The
//! transition is one-way.
//!
//! Rendering with [`Display`](std::fmt::Display) and encoding with
//! [`Document::to_vec`] do not need the elements; an unmaterialized document
//! feeds the writer straight from the host object and stays unmaterialized.

use std::{
    any::Any,
    sync::{Arc, OnceLock},
};

use crate::{BsonWriter, Document, Error, Result, ValueBuilder, document::Backing, document::ElementList};

/// Turns a host object into one document, written to a [`BsonWriter`].
///
/// Implementations must write exactly one document: start it, write
/// named values, and end it.
///
/// # Example
///
/// ```
/// use na_bson::{BsonWriter, Document, DocumentSerializer, Result};
/// use std::sync::Arc;
///
/// struct Point { x: i32, y: i32 }
///
/// struct PointSerializer;
///
/// impl DocumentSerializer<Point> for PointSerializer {
///     fn serialize(&self, writer: &mut dyn BsonWriter, point: &Point) -> Result<()> {
///         writer.write_start_document()?;
///         writer.write_name("x")?;
///         writer.write_int32(point.x)?;
///         writer.write_name("y")?;
///         writer.write_int32(point.y)?;
///         writer.write_end_document()
///     }
/// }
///
/// let doc = Document::wrap_with(Some(Arc::new(Point { x: 1, y: 2 })), Arc::new(PointSerializer));
/// assert!(!doc.is_materialized());
/// assert_eq!(doc.to_string(), r#"{"x":1,"y":2}"#);
/// assert!(!doc.is_materialized());
/// assert_eq!(doc.len(), 2);
/// assert!(doc.is_materialized());
/// ```
pub trait DocumentSerializer<T: ?Sized>: Send + Sync {
    fn serialize(&self, writer: &mut dyn BsonWriter, value: &T) -> Result<()>;
}

/// Serializes any [`serde::Serialize`] host object.
#[cfg(feature = "serde")]
#[derive(Clone, Copy, Default, Debug)]
pub struct SerdeSerializer;

#[cfg(feature = "serde")]
impl<T: serde::Serialize + ?Sized> DocumentSerializer<T> for SerdeSerializer {
    fn serialize(&self, writer: &mut dyn BsonWriter, value: &T) -> Result<()> {
        crate::ser::serialize_into(writer, value)
    }
}

/// The wrapped object and its serializer, with the object's type erased.
trait Source: Send + Sync {
    fn write(&self, writer: &mut dyn BsonWriter) -> Result<()>;

    fn wrapped(&self) -> Option<&(dyn Any + Send + Sync)>;
}

struct Wrapped<T, S> {
    value: Option<Arc<T>>,
    serializer: Arc<S>,
}

impl<T, S> Source for Wrapped<T, S>
where
    T: Any + Send + Sync,
    S: DocumentSerializer<T> + 'static,
{
    fn write(&self, writer: &mut dyn BsonWriter) -> Result<()> {
        match &self.value {
            Some(value) => self.serializer.serialize(writer, value),
            None => {
                writer.write_start_document()?;
                writer.write_end_document()
            }
        }
    }

    fn wrapped(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.value
            .as_deref()
            .map(|value| value as &(dyn Any + Send + Sync))
    }
}

/// Backing of a wrapped document.
///
/// An empty cell is the unmaterialized state; a filled cell is the
/// materialized state and is never emptied again.
pub(crate) struct LazyDocument {
    source: Arc<dyn Source>,
    elements: OnceLock<ElementList>,
}

impl LazyDocument {
    fn run_serializer(&self) -> Result<ElementList> {
        tracing::trace!("materializing wrapped document");
        let mut builder = ValueBuilder::new();
        self.source.write(&mut builder)?;
        let list = builder.into_document()?.into_element_list();
        tracing::debug!(elements = list.len(), "materialized wrapped document");
        Ok(list)
    }

    #[inline]
    pub(crate) fn is_materialized(&self) -> bool {
        self.elements.get().is_some()
    }

    pub(crate) fn try_materialized(&self) -> Result<&ElementList> {
        if let Some(list) = self.elements.get() {
            return Ok(list);
        }
        let list = self.run_serializer()?;
        Ok(self.elements.get_or_init(|| list))
    }

    /// # Panics
    ///
    /// Panics if the serializer fails. Use [`Document::try_materialize`]
    /// first to handle that case.
    pub(crate) fn materialized(&self) -> &ElementList {
        match self.try_materialized() {
            Ok(list) => list,
            Err(e) => {
                tracing::debug!(error = %e, "wrapped document failed to materialize");
                panic!("wrapped document failed to materialize: {e}")
            }
        }
    }

    pub(crate) fn materialized_mut(&mut self) -> Result<&mut ElementList> {
        if !self.is_materialized() {
            let list = self.run_serializer()?;
            self.elements = OnceLock::from(list);
        }
        self.elements
            .get_mut()
            .ok_or(Error::InvalidState("wrapped document did not materialize"))
    }

    pub(crate) fn into_materialized(self) -> ElementList {
        self.materialized();
        self.elements.into_inner().unwrap_or_default()
    }

    /// A second lazy document over the same object, or `None` once
    /// materialized.
    pub(crate) fn clone_unmaterialized(&self) -> Option<LazyDocument> {
        (!self.is_materialized()).then(|| LazyDocument {
            source: Arc::clone(&self.source),
            elements: OnceLock::new(),
        })
    }

    /// Feeds `writer` from the wrapped object without materializing.
    pub(crate) fn write_unmaterialized(&self, writer: &mut dyn BsonWriter) -> Result<()> {
        self.source.write(writer)
    }
}

impl Document {
    /// Wraps a host object, serialized with serde on first use.
    ///
    /// `None` wraps nothing and materializes to an empty document. `T` must
    /// serialize as a map or a struct. Anything else fails to materialize:
    /// [`Document::try_materialize`] reports the error, and every other
    /// operation that needs the elements panics.
    ///
    /// # Example
    ///
    /// ```
    /// use na_bson::{Document, Value};
    ///
    /// #[derive(serde::Serialize)]
    /// struct User { name: String, age: u8 }
    ///
    /// let doc = Document::wrap(Some(User { name: "ada".into(), age: 36 }));
    /// assert!(!doc.is_materialized());
    /// assert_eq!(doc.get("age"), Some(Value::from(36)));
    /// assert!(doc.is_materialized());
    /// ```
    #[cfg(feature = "serde")]
    pub fn wrap<T>(wrapped: Option<T>) -> Self
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        Self::wrap_with(wrapped.map(Arc::new), Arc::new(SerdeSerializer))
    }

    /// Wraps a host object with a custom serializer.
    ///
    /// The serializer must write exactly one document. If it fails,
    /// [`Document::try_materialize`] returns its error and operations that
    /// need the elements panic.
    pub fn wrap_with<T, S>(wrapped: Option<Arc<T>>, serializer: Arc<S>) -> Self
    where
        T: Send + Sync + 'static,
        S: DocumentSerializer<T> + 'static,
    {
        Self {
            backing: Backing::Lazy(LazyDocument {
                source: Arc::new(Wrapped {
                    value: wrapped,
                    serializer,
                }),
                elements: OnceLock::new(),
            }),
        }
    }

    /// The wrapped host object, if this is a wrapped document holding a `T`.
    ///
    /// Still available after materialization.
    pub fn wrapped<T: Any>(&self) -> Option<&T> {
        match &self.backing {
            Backing::Lazy(lazy) => lazy.source.wrapped()?.downcast_ref(),
            _ => None,
        }
    }

    /// `true` for documents created by [`Document::wrap`] or
    /// [`Document::wrap_with`].
    pub fn is_wrapper(&self) -> bool {
        matches!(self.backing, Backing::Lazy(_))
    }
}
