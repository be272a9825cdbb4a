use std::{fmt, io::Write};

use crate::{
    BinaryWriter, Error, Index, JsonWriter, JsonWriterSettings, RawDocument, Result, Value,
    cold_path, reader::BsonReader, wrapper::LazyDocument,
};

mod element;
mod list;

pub use element::*;
pub(crate) use list::ElementList;

pub(crate) enum Backing {
    Owned(ElementList),
    Lazy(LazyDocument),
    Raw(RawDocument),
}

/// An ordered collection of named values.
///
/// Names need not be unique; lookups by name resolve to the first match.
///
/// A document is backed by one of three representations, which read alike:
///
/// - an owned element list,
/// - a wrapped host object that is serialized into elements on first use
///   (see [`Document::wrap`]),
/// - a read-only view over encoded bytes (see [`Document::from_raw`]).
///
/// Mutating methods return [`Result`] and fail with
/// [`Error::NotSupported`] on a raw backing.
///
/// # Example
///
/// ```
/// use na_bson::{Document, Value};
///
/// let mut doc = Document::new();
/// doc.add("name", "widget").unwrap().add("count", 3).unwrap();
///
/// assert_eq!(doc.len(), 2);
/// assert_eq!(doc.get("count"), Some(Value::from(3)));
/// assert_eq!(doc.to_string(), r#"{"name":"widget","count":3}"#);
/// ```
pub struct Document {
    pub(crate) backing: Backing,
}

enum View<'a> {
    Elements(&'a ElementList),
    Raw(&'a RawDocument),
}

const READ_ONLY: Error = Error::NotSupported("raw documents are read-only");

impl Document {
    pub fn new() -> Self {
        Self::from_list(ElementList::default())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_list(ElementList::with_capacity(capacity))
    }

    #[inline]
    pub(crate) fn from_list(list: ElementList) -> Self {
        Self {
            backing: Backing::Owned(list),
        }
    }

    /// A read-only document over validated bytes.
    #[inline]
    pub fn from_raw(raw: RawDocument) -> Self {
        Self {
            backing: Backing::Raw(raw),
        }
    }

    /// Decodes one encoded document, at every level, into owned elements.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut reader = BsonReader::new(bytes);
        let document = reader.read_document()?;
        match reader.remaining() {
            0 => Ok(document),
            remaining => {
                cold_path();
                Err(Error::TrailingData(remaining))
            }
        }
    }

    /// The raw view backing this document, if any.
    pub fn as_raw(&self) -> Option<&RawDocument> {
        match &self.backing {
            Backing::Raw(raw) => Some(raw),
            _ => None,
        }
    }

    fn view(&self) -> View<'_> {
        match &self.backing {
            Backing::Owned(list) => View::Elements(list),
            Backing::Lazy(lazy) => View::Elements(lazy.materialized()),
            Backing::Raw(raw) => View::Raw(raw),
        }
    }

    fn elements_mut(&mut self) -> Result<&mut ElementList> {
        match &mut self.backing {
            Backing::Owned(list) => Ok(list),
            Backing::Lazy(lazy) => lazy.materialized_mut(),
            Backing::Raw(_) => {
                cold_path();
                Err(READ_ONLY)
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match self.view() {
            View::Elements(list) => list.len(),
            View::Raw(raw) => raw.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` only for documents backed by encoded bytes.
    #[inline]
    pub fn is_read_only(&self) -> bool {
        matches!(self.backing, Backing::Raw(_))
    }

    /// `true` unless this is a wrapped document that has not yet been
    /// serialized into elements, or a raw view.
    pub fn is_materialized(&self) -> bool {
        match &self.backing {
            Backing::Owned(_) => true,
            Backing::Lazy(lazy) => lazy.is_materialized(),
            Backing::Raw(_) => false,
        }
    }

    /// Serializes a wrapped document into elements now, reporting a
    /// serializer failure instead of panicking later.
    ///
    /// Does nothing for other backings, or if already materialized.
    pub fn try_materialize(&self) -> Result<()> {
        match &self.backing {
            Backing::Lazy(lazy) => lazy.try_materialized().map(drop),
            _ => Ok(()),
        }
    }

    /// Position of the first element named `name`.
    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        match self.view() {
            View::Elements(list) => list.position(name),
            View::Raw(raw) => raw.position(name),
        }
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index_of_name(name).is_some()
    }

    pub fn contains_value(&self, value: &Value) -> bool {
        self.iter().any(|element| element.value() == value)
    }

    fn value_at(&self, index: usize) -> Option<Value> {
        match self.view() {
            View::Elements(list) => list.get(index).map(|element| element.value().clone()),
            View::Raw(raw) => raw.value_at(index),
        }
    }

    /// The value at a position or under a name, if present.
    #[inline]
    pub fn get<I: Index>(&self, index: I) -> Option<Value> {
        index.position_in(self).and_then(|i| self.value_at(i))
    }

    /// The value at a position or under a name.
    ///
    /// Fails with [`Error::OutOfRange`] or [`Error::KeyNotFound`].
    pub fn value<I: Index>(&self, index: I) -> Result<Value> {
        match self.get(&index) {
            Some(value) => Ok(value),
            None => {
                cold_path();
                Err(index.missing(self))
            }
        }
    }

    pub fn element(&self, index: usize) -> Result<Element> {
        let element = match self.view() {
            View::Elements(list) => list.get(index).cloned(),
            View::Raw(raw) => raw.element_at(index),
        };
        element.ok_or_else(|| {
            cold_path();
            Error::OutOfRange {
                index,
                len: self.len(),
            }
        })
    }

    pub fn iter(&self) -> DocumentIter<'_> {
        match self.view() {
            View::Elements(list) => DocumentIter::Elements(list.as_slice().iter()),
            View::Raw(raw) => DocumentIter::Raw(raw.iter()),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = String> + '_ {
        self.iter().map(|element| element.into_parts().0)
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.iter().map(|element| element.into_parts().1)
    }

    pub fn to_elements(&self) -> Vec<Element> {
        self.iter().collect()
    }

    /// Appends an element. Duplicate names are allowed.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        self.add_element(Element::new(name, value))
    }

    pub fn add_if(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        condition: bool,
    ) -> Result<&mut Self> {
        if condition {
            self.add(name, value)
        } else {
            Ok(self)
        }
    }

    /// Like [`Document::add_if`], but the value is only built when
    /// `condition` holds.
    pub fn add_with<V: Into<Value>>(
        &mut self,
        name: impl Into<String>,
        factory: impl FnOnce() -> V,
        condition: bool,
    ) -> Result<&mut Self> {
        if condition {
            self.add(name, factory())
        } else {
            Ok(self)
        }
    }

    pub fn add_element(&mut self, element: Element) -> Result<&mut Self> {
        self.elements_mut()?.push(element);
        Ok(self)
    }

    /// Appends every pair in order.
    pub fn add_range<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<&mut Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let list = self.elements_mut()?;
        list.extend(pairs.into_iter().map(Element::from).collect());
        Ok(self)
    }

    /// Inserts at `index`, shifting later elements. `index` may equal `len`.
    pub fn insert(&mut self, index: usize, element: Element) -> Result<&mut Self> {
        let list = self.elements_mut()?;
        if index > list.len() {
            cold_path();
            return Err(Error::OutOfRange {
                index,
                len: list.len(),
            });
        }
        list.insert(index, element);
        Ok(self)
    }

    /// Replaces the value of the first element named `name`, or appends a
    /// new element if there is none.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        let name = name.into();
        let list = self.elements_mut()?;
        match list.position(&name) {
            Some(i) => {
                list.replace(i, value.into());
            }
            None => list.push(Element::new(name, value)),
        }
        Ok(self)
    }

    /// Replaces the value at `index`, keeping its name.
    pub fn set_at(&mut self, index: usize, value: impl Into<Value>) -> Result<Value> {
        let list = self.elements_mut()?;
        if index >= list.len() {
            cold_path();
            return Err(Error::OutOfRange {
                index,
                len: list.len(),
            });
        }
        Ok(list.replace(index, value.into()))
    }

    /// Mutable access to the value at a position or under a name.
    ///
    /// The returned handle may be shared with other documents; mutate it
    /// through [`Value::make_mut`] to keep them unaffected.
    pub fn get_mut<I: Index>(&mut self, index: I) -> Result<Option<&mut Value>> {
        self.elements_mut()?;
        let position = index.position_in(self);
        let list = self.elements_mut()?;
        Ok(position
            .and_then(|i| list.get_mut(i))
            .map(Element::value_mut))
    }

    /// Removes every element named `name`. Returns whether any was removed.
    pub fn remove(&mut self, name: &str) -> Result<bool> {
        Ok(self.elements_mut()?.remove_all(name) > 0)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Element> {
        let list = self.elements_mut()?;
        if index >= list.len() {
            cold_path();
            return Err(Error::OutOfRange {
                index,
                len: list.len(),
            });
        }
        Ok(list.remove(index))
    }

    /// Removes the first element equal to `element` (same name, equal value).
    pub fn remove_element(&mut self, element: &Element) -> Result<bool> {
        let list = self.elements_mut()?;
        match list.as_slice().iter().position(|e| e == element) {
            Some(i) => {
                list.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        self.elements_mut()?.clear();
        Ok(())
    }

    /// Copies every element of `other` into this document.
    ///
    /// An element whose name already exists replaces the existing value when
    /// `overwrite` is set and is skipped otherwise. New names are appended.
    pub fn merge(&mut self, other: &Document, overwrite: bool) -> Result<&mut Self> {
        let incoming = other.to_elements();
        let list = self.elements_mut()?;
        for element in incoming {
            match list.position(element.name()) {
                Some(i) if overwrite => {
                    list.replace(i, element.into_parts().1);
                }
                Some(_) => {}
                None => list.push(element),
            }
        }
        Ok(self)
    }

    /// Recursively copies every nested document and array. The result is
    /// always an owned, mutable document.
    pub fn deep_clone(&self) -> Document {
        match self.view() {
            View::Elements(list) => Document::from_list(list.deep_clone()),
            View::Raw(raw) => raw.to_document(),
        }
    }

    /// Encodes this document. A wrapped document that has not been
    /// materialized is serialized straight to the encoder.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        if let Backing::Raw(raw) = &self.backing {
            return Ok(raw.as_bytes().to_vec());
        }
        let mut writer = BinaryWriter::new();
        crate::writer::write_document(&mut writer, self)?;
        writer.into_bytes()
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        match &self.backing {
            Backing::Raw(raw) => writer.write_all(raw.as_bytes())?,
            _ => writer.write_all(&self.to_vec()?)?,
        }
        Ok(())
    }

    /// Renders relaxed Extended JSON.
    pub fn to_json(&self) -> String {
        self.to_string()
    }

    pub fn to_json_with(&self, settings: JsonWriterSettings) -> Result<String> {
        JsonWriter::render_document(self, settings)
    }

    pub(crate) fn into_element_list(self) -> ElementList {
        match self.backing {
            Backing::Owned(list) => list,
            Backing::Lazy(lazy) => lazy.into_materialized(),
            Backing::Raw(raw) => ElementList::from_elements(raw.iter().collect()),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Document {
    /// Copies the element list; values stay shared.
    ///
    /// A wrapped document that is not yet materialized stays lazy and shares
    /// the wrapped object. A raw document is decoded at every level into an
    /// owned, mutable copy that does not hold the buffer.
    fn clone(&self) -> Self {
        match &self.backing {
            Backing::Owned(list) => Document::from_list(list.clone()),
            Backing::Lazy(lazy) => match lazy.clone_unmaterialized() {
                Some(lazy) => Document {
                    backing: Backing::Lazy(lazy),
                },
                None => Document::from_list(lazy.materialized().clone()),
            },
            Backing::Raw(raw) => raw.to_document(),
        }
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Backing::Lazy(lazy) = &self.backing {
            if !lazy.is_materialized() {
                return f.write_str("Document(<not materialized>)");
            }
        }
        f.debug_map()
            .entries(self.iter().map(Element::into_parts))
            .finish()
    }
}

impl fmt::Display for Document {
    /// Relaxed Extended JSON. A wrapped document that has not been
    /// materialized is rendered straight from the wrapped object and stays
    /// unmaterialized.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = JsonWriter::render_document(self, JsonWriterSettings::default())
            .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_list(ElementList::from_elements(
            iter.into_iter().map(Element::from).collect(),
        ))
    }
}

impl FromIterator<Element> for Document {
    fn from_iter<T: IntoIterator<Item = Element>>(iter: T) -> Self {
        Self::from_list(ElementList::from_elements(iter.into_iter().collect()))
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = Element;
    type IntoIter = DocumentIter<'a>;

    fn into_iter(self) -> DocumentIter<'a> {
        self.iter()
    }
}

/// Iterator over the elements of a [`Document`], in order.
pub enum DocumentIter<'a> {
    #[doc(hidden)]
    Elements(std::slice::Iter<'a, Element>),
    #[doc(hidden)]
    Raw(crate::RawIter<'a>),
}

impl Iterator for DocumentIter<'_> {
    type Item = Element;

    #[inline]
    fn next(&mut self) -> Option<Element> {
        match self {
            DocumentIter::Elements(iter) => iter.next().cloned(),
            DocumentIter::Raw(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            DocumentIter::Elements(iter) => iter.size_hint(),
            DocumentIter::Raw(iter) => iter.size_hint(),
        }
    }
}

impl ExactSizeIterator for DocumentIter<'_> {}

/// Builds a [`Document`] from `name => value` pairs.
///
/// ```
/// use na_bson::doc;
///
/// let doc = doc! { "a" => 1, "b" => "two" };
/// assert_eq!(doc.len(), 2);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::Document::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        <$crate::Document as ::core::iter::FromIterator<$crate::Element>>::from_iter([
            $($crate::Element::new($name, $value)),+
        ])
    };
}
