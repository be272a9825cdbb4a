//! Read-only views over encoded BSON bytes.
//!
//! A [`RawDocument`] is validated once, when it is created. After that every
//! read is infallible: the element offset index is built on first access
//! and values are decoded on demand into transient [`Value`]s. Nested
//! documents and arrays are returned as raw views over slices of the same
//! buffer, so nothing is copied until a scalar is decoded.
//!
//! The buffer is reference counted through [`Bytes`]. It is released when
//! the last view derived from it is dropped, or handed back to the caller
//! with [`RawDocument::try_reclaim`] when no other view is alive.

use std::{fmt, ops::Range, sync::OnceLock};

use bytes::{Bytes, BytesMut};

use crate::{
    Array, BsonValue, Document, Element, Error, Kind, Result, Value, cold_path,
    reader::{BsonReader, MAX_DEPTH},
};

struct Slot {
    kind: Kind,
    name: Range<usize>,
    value: Range<usize>,
}

/// A validated, immutable document over shared bytes.
///
/// Construction validates every nesting level, so its cost grows with the
/// total encoded size. Only the top-level offset index is built on first
/// access; nested documents are indexed when they are read.
///
/// # Example
///
/// ```
/// use na_bson::{Document, RawDocument, Value};
///
/// let doc: Document = [("a", Value::from(1)), ("b", Value::from("x"))].into_iter().collect();
/// let raw = RawDocument::from_vec(doc.to_vec().unwrap()).unwrap();
///
/// assert_eq!(raw.len(), 2);
/// assert_eq!(raw.get("b"), Some(Value::from("x")));
/// ```
pub struct RawDocument {
    bytes: Bytes,
    index: OnceLock<Vec<Slot>>,
}

impl RawDocument {
    /// Validates `bytes` as exactly one document.
    pub fn from_bytes(bytes: Bytes) -> Result<Self> {
        if let Err(e) = validate(&bytes) {
            tracing::debug!(len = bytes.len(), error = %e, "rejected raw document");
            return Err(e);
        }
        Ok(Self::new_unchecked(bytes))
    }

    pub fn from_vec(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(Bytes::from(bytes))
    }

    /// Copies `bytes` into a new buffer and validates it.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes(Bytes::copy_from_slice(bytes))
    }

    pub fn from_static(bytes: &'static [u8]) -> Result<Self> {
        Self::from_bytes(Bytes::from_static(bytes))
    }

    /// `bytes` must already have passed validation.
    #[inline]
    pub(crate) fn new_unchecked(bytes: Bytes) -> Self {
        Self {
            bytes,
            index: OnceLock::new(),
        }
    }

    fn slots(&self) -> &[Slot] {
        self.index.get_or_init(|| {
            let slots = build_index(&self.bytes);
            tracing::trace!(
                elements = slots.len(),
                bytes = self.bytes.len(),
                "indexed raw document"
            );
            slots
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.len() <= 5
    }

    /// The encoded document, length prefix and terminator included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    fn name_of(&self, slot: &Slot) -> &str {
        std::str::from_utf8(&self.bytes[slot.name.clone()]).unwrap_or_default()
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.slots().get(index).map(|slot| self.name_of(slot))
    }

    pub fn kind_at(&self, index: usize) -> Option<Kind> {
        self.slots().get(index).map(|slot| slot.kind)
    }

    /// Position of the first element named `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.slots()
            .iter()
            .position(|slot| self.name_of(slot) == name)
    }

    pub fn value_at(&self, index: usize) -> Option<Value> {
        self.slots().get(index).map(|slot| self.decode(slot))
    }

    pub fn element_at(&self, index: usize) -> Option<Element> {
        self.slots()
            .get(index)
            .map(|slot| Element::new(self.name_of(slot), self.decode(slot)))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.position(name).and_then(|i| self.value_at(i))
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> RawIter<'_> {
        RawIter {
            document: self,
            next: 0,
        }
    }

    /// Decodes every level into an owned, mutable document.
    pub fn to_document(&self) -> Document {
        match BsonReader::new(&self.bytes).read_document() {
            Ok(document) => document,
            Err(e) => {
                cold_path();
                tracing::error!(error = %e, "validated raw document failed to decode");
                Document::new()
            }
        }
    }

    /// Returns the underlying buffer if no other view shares it.
    ///
    /// When any nested view or another handle to the same buffer is still
    /// alive, the document is handed back unchanged.
    pub fn try_reclaim(self) -> std::result::Result<BytesMut, Self> {
        let len = self.bytes.len();
        match self.bytes.try_into_mut() {
            Ok(buffer) => {
                tracing::trace!(len, "reclaimed raw document buffer");
                Ok(buffer)
            }
            Err(bytes) => {
                tracing::trace!(len, "raw document buffer still shared");
                Err(Self::new_unchecked(bytes))
            }
        }
    }

    fn decode(&self, slot: &Slot) -> Value {
        match slot.kind {
            Kind::Document => Value::new(BsonValue::Document(Document::from_raw(
                RawDocument::new_unchecked(self.bytes.slice(slot.value.clone())),
            ))),
            Kind::Array => Value::new(BsonValue::Array(Array::from_raw(RawArray::new_unchecked(
                self.bytes.slice(slot.value.clone()),
            )))),
            Kind::JavaScriptWithScope => {
                let block = &self.bytes[slot.value.clone()];
                let mut reader = BsonReader::new(&block[4..]);
                let code = reader.read_string().map(str::to_owned);
                let scope_start = slot.value.start + 4 + reader.position();
                match code {
                    Ok(code) => Value::new(BsonValue::JavaScriptWithScope {
                        code,
                        scope: Document::from_raw(RawDocument::new_unchecked(
                            self.bytes.slice(scope_start..slot.value.end),
                        )),
                    }),
                    Err(e) => corrupted(e),
                }
            }
            kind => match BsonReader::new(&self.bytes[slot.value.clone()]).read_scalar(kind) {
                Ok(value) => Value::new(value),
                Err(e) => corrupted(e),
            },
        }
    }
}

#[cold]
fn corrupted(error: Error) -> Value {
    tracing::error!(%error, "validated raw value failed to decode");
    Value::null()
}

impl Clone for RawDocument {
    /// Shares the buffer; the offset index is rebuilt on demand.
    fn clone(&self) -> Self {
        Self::new_unchecked(self.bytes.clone())
    }
}

impl fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDocument")
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Iterator over the elements of a [`RawDocument`].
pub struct RawIter<'a> {
    document: &'a RawDocument,
    next: usize,
}

impl Iterator for RawIter<'_> {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        let element = self.document.element_at(self.next)?;
        self.next += 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.document.len().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for RawIter<'_> {}

impl<'a> IntoIterator for &'a RawDocument {
    type Item = Element;
    type IntoIter = RawIter<'a>;

    fn into_iter(self) -> RawIter<'a> {
        self.iter()
    }
}

/// A validated, immutable array over shared bytes.
///
/// Arrays share the document layout; element names are ignored.
#[derive(Clone, Debug)]
pub struct RawArray {
    document: RawDocument,
}

impl RawArray {
    pub fn from_bytes(bytes: Bytes) -> Result<Self> {
        RawDocument::from_bytes(bytes).map(|document| Self { document })
    }

    #[inline]
    pub(crate) fn new_unchecked(bytes: Bytes) -> Self {
        Self {
            document: RawDocument::new_unchecked(bytes),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.document.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.document.as_bytes()
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.document.value_at(index)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Value> + '_ {
        self.document.iter().map(|element| element.into_parts().1)
    }

    /// Decodes every level into an owned, mutable array.
    pub fn to_array(&self) -> Array {
        self.iter()
            .map(|value| match &*value {
                BsonValue::Document(_) | BsonValue::Array(_) | BsonValue::JavaScriptWithScope { .. } => {
                    value.deep_clone()
                }
                _ => value,
            })
            .collect()
    }
}

/// Checks framing, lengths, type bytes, UTF-8, and trailing data.
fn validate(bytes: &[u8]) -> Result<()> {
    let mut reader = BsonReader::new(bytes);
    validate_document(&mut reader, 0)?;
    match reader.remaining() {
        0 => Ok(()),
        remaining => {
            cold_path();
            Err(Error::TrailingData(remaining))
        }
    }
}

fn validate_document(reader: &mut BsonReader<'_>, depth: usize) -> Result<()> {
    let mut body = reader.enter(depth)?;
    while let Some(kind) = body.read_kind()? {
        body.read_cstr()?;
        validate_value(&mut body, kind, depth + 1)?;
    }
    body.finish()
}

fn validate_value(reader: &mut BsonReader<'_>, kind: Kind, depth: usize) -> Result<()> {
    match kind {
        Kind::Document | Kind::Array => validate_document(reader, depth),
        Kind::JavaScriptWithScope => {
            if depth >= MAX_DEPTH {
                cold_path();
                return Err(Error::Malformed("nesting too deep"));
            }
            let block = reader.read_length_prefixed(14)?;
            let mut inner = BsonReader::new(&block[4..]);
            inner.read_string()?;
            validate_document(&mut inner, depth)?;
            if inner.remaining() != 0 {
                cold_path();
                return Err(Error::Malformed("code with scope length mismatch"));
            }
            Ok(())
        }
        Kind::Boolean => reader.read_boolean().map(drop),
        Kind::RegularExpression => reader.read_regex().map(drop),
        _ => reader.skip_value(kind),
    }
}

/// Offsets of every top-level element. `bytes` must be validated.
fn build_index(bytes: &[u8]) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut reader = BsonReader::new(bytes);
    // Start of the element list, after the length prefix.
    let base = 4;
    let mut body = match reader.enter(0) {
        Ok(body) => body,
        Err(_) => return slots,
    };
    loop {
        let kind = match body.read_kind() {
            Ok(Some(kind)) => kind,
            _ => break,
        };
        let name_start = base + body.position();
        if body.read_cstr().is_err() {
            break;
        }
        let value_start = base + body.position();
        if body.skip_value(kind).is_err() {
            break;
        }
        slots.push(Slot {
            kind,
            name: name_start..value_start - 1,
            value: value_start..base + body.position(),
        });
    }
    slots
}
