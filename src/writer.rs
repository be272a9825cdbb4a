//! The writer contract that serializers, encoders, and builders share.
//!
//! A [`BsonWriter`] is driven with a strict call sequence: a top-level
//! document is opened, each element is written as a name followed by a
//! value, and every opened document or array is closed again. Array
//! elements take no name; their positions supply it. Calls out of order
//! fail with [`Error::InvalidState`](crate::Error::InvalidState).

use crate::{
    Array, Binary, BsonValue, DateTime, Decimal128, Document, Error, Kind, ObjectId, Regex, Result,
    Timestamp, cold_path, document::Backing,
};

mod binary;
mod builder;
mod json;

pub use binary::*;
pub use builder::*;
pub use json::*;

/// A sink for one BSON document, written element by element.
pub trait BsonWriter {
    fn write_start_document(&mut self) -> Result<()>;

    fn write_end_document(&mut self) -> Result<()>;

    fn write_start_array(&mut self) -> Result<()>;

    fn write_end_array(&mut self) -> Result<()>;

    /// Names the next value. Only valid directly inside a document.
    fn write_name(&mut self, name: &str) -> Result<()>;

    fn write_double(&mut self, value: f64) -> Result<()>;

    fn write_string(&mut self, value: &str) -> Result<()>;

    fn write_symbol(&mut self, value: &str) -> Result<()>;

    fn write_binary(&mut self, value: &Binary) -> Result<()>;

    fn write_object_id(&mut self, value: ObjectId) -> Result<()>;

    fn write_boolean(&mut self, value: bool) -> Result<()>;

    fn write_date_time(&mut self, value: DateTime) -> Result<()>;

    fn write_null(&mut self) -> Result<()>;

    fn write_regular_expression(&mut self, value: &Regex) -> Result<()>;

    fn write_javascript(&mut self, code: &str) -> Result<()>;

    /// Starts a code-with-scope value. The scope follows as one document,
    /// opened with [`BsonWriter::write_start_document`].
    fn write_javascript_with_scope(&mut self, code: &str) -> Result<()>;

    fn write_int32(&mut self, value: i32) -> Result<()>;

    fn write_timestamp(&mut self, value: Timestamp) -> Result<()>;

    fn write_int64(&mut self, value: i64) -> Result<()>;

    fn write_decimal128(&mut self, value: Decimal128) -> Result<()>;

    fn write_min_key(&mut self) -> Result<()>;

    fn write_max_key(&mut self) -> Result<()>;

    /// Copies an already encoded document or array verbatim.
    ///
    /// Returns `false` when the writer cannot take encoded bytes, in which
    /// case the caller writes the elements one by one instead.
    fn write_encoded(&mut self, _kind: Kind, _bytes: &[u8]) -> Result<bool> {
        Ok(false)
    }
}

/// Writes `document` as the next value.
///
/// A wrapped document that has not been materialized is serialized from the
/// wrapped object directly and stays unmaterialized.
pub fn write_document(writer: &mut dyn BsonWriter, document: &Document) -> Result<()> {
    match &document.backing {
        Backing::Lazy(lazy) if !lazy.is_materialized() => lazy.write_unmaterialized(writer),
        Backing::Raw(raw) if writer.write_encoded(Kind::Document, raw.as_bytes())? => Ok(()),
        _ => {
            writer.write_start_document()?;
            for element in document {
                writer.write_name(element.name())?;
                write_value(writer, element.value())?;
            }
            writer.write_end_document()
        }
    }
}

pub fn write_array(writer: &mut dyn BsonWriter, array: &Array) -> Result<()> {
    if let Some(raw) = array.as_raw() {
        if writer.write_encoded(Kind::Array, raw.as_bytes())? {
            return Ok(());
        }
    }
    writer.write_start_array()?;
    for value in array {
        write_value(writer, &value)?;
    }
    writer.write_end_array()
}

/// Writes one value of any kind.
pub fn write_value(writer: &mut dyn BsonWriter, value: &BsonValue) -> Result<()> {
    match value {
        BsonValue::MinKey => writer.write_min_key(),
        BsonValue::Null => writer.write_null(),
        BsonValue::Int32(n) => writer.write_int32(*n),
        BsonValue::Int64(n) => writer.write_int64(*n),
        BsonValue::Double(n) => writer.write_double(*n),
        BsonValue::Decimal128(n) => writer.write_decimal128(*n),
        BsonValue::String(text) => writer.write_string(text),
        BsonValue::Symbol(text) => writer.write_symbol(text),
        BsonValue::Document(document) => write_document(writer, document),
        BsonValue::Array(array) => write_array(writer, array),
        BsonValue::Binary(binary) => writer.write_binary(binary),
        BsonValue::ObjectId(id) => writer.write_object_id(*id),
        BsonValue::Boolean(b) => writer.write_boolean(*b),
        BsonValue::DateTime(dt) => writer.write_date_time(*dt),
        BsonValue::Timestamp(ts) => writer.write_timestamp(*ts),
        BsonValue::RegularExpression(regex) => writer.write_regular_expression(regex),
        BsonValue::JavaScript(code) => writer.write_javascript(code),
        BsonValue::JavaScriptWithScope { code, scope } => {
            writer.write_javascript_with_scope(code)?;
            write_document(writer, scope)
        }
        BsonValue::MaxKey => writer.write_max_key(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Frame {
    Document,
    Array { next_index: usize },
    /// Code has been written; the scope document comes next.
    Scope,
    /// Inside the scope document of a code-with-scope value.
    ScopeDocument,
}

/// Where a value being written lands.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Position {
    /// The outermost document.
    Root,
    /// A named element of a document, or an indexed element of an array.
    Element(String),
    /// The scope of a code-with-scope value.
    Scope,
}

/// What closing a document finished.
pub(crate) struct Closed {
    /// The document was a code-with-scope scope, which is now complete.
    pub(crate) scope: bool,
}

/// Call-order bookkeeping shared by every writer.
pub(crate) struct WriterContext {
    stack: Vec<Frame>,
    pending_name: Option<String>,
    finished: bool,
    any_root: bool,
}

impl WriterContext {
    /// A context that accepts only a document at the top level.
    pub(crate) fn new() -> Self {
        Self {
            stack: Vec::new(),
            pending_name: None,
            finished: false,
            any_root: false,
        }
    }

    /// A context that accepts a single value of any kind at the top level.
    pub(crate) fn any_root() -> Self {
        Self {
            any_root: true,
            ..Self::new()
        }
    }

    #[inline]
    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    /// `true` when the innermost open container is an array.
    pub(crate) fn in_array(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Array { .. }))
    }

    pub(crate) fn write_name(&mut self, name: &str) -> Result<()> {
        if !matches!(self.stack.last(), Some(Frame::Document | Frame::ScopeDocument)) {
            cold_path();
            return Err(Error::InvalidState("a name can only be written inside a document"));
        }
        if self.pending_name.is_some() {
            cold_path();
            return Err(Error::InvalidState("a name is already pending"));
        }
        self.pending_name = Some(name.to_owned());
        Ok(())
    }

    /// Claims the slot for the next value of `kind`.
    pub(crate) fn next_value(&mut self, kind: Kind) -> Result<Position> {
        match self.stack.last_mut() {
            None => {
                if self.finished {
                    cold_path();
                    return Err(Error::InvalidState("the top-level value is already complete"));
                }
                if kind != Kind::Document && !self.any_root {
                    cold_path();
                    return Err(Error::TopLevelNotDocument(kind));
                }
                if kind != Kind::Document && kind != Kind::Array && kind != Kind::JavaScriptWithScope {
                    self.finished = true;
                }
                Ok(Position::Root)
            }
            Some(Frame::Document | Frame::ScopeDocument) => match self.pending_name.take() {
                Some(name) => Ok(Position::Element(name)),
                None => {
                    cold_path();
                    Err(Error::InvalidState("a value inside a document needs a name"))
                }
            },
            Some(Frame::Array { next_index }) => {
                let index = *next_index;
                *next_index += 1;
                Ok(Position::Element(index.to_string()))
            }
            Some(Frame::Scope) => {
                if kind != Kind::Document {
                    cold_path();
                    return Err(Error::InvalidState("code with scope must be followed by a document"));
                }
                Ok(Position::Scope)
            }
        }
    }

    /// Opens a document at `position`, as returned by
    /// [`WriterContext::next_value`].
    pub(crate) fn open_document(&mut self, position: &Position) {
        self.stack.push(match position {
            Position::Scope => Frame::ScopeDocument,
            _ => Frame::Document,
        });
    }

    pub(crate) fn open_array(&mut self) {
        self.stack.push(Frame::Array { next_index: 0 });
    }

    pub(crate) fn open_scope(&mut self) {
        self.stack.push(Frame::Scope);
    }

    pub(crate) fn close_document(&mut self) -> Result<Closed> {
        if self.pending_name.is_some() {
            cold_path();
            return Err(Error::InvalidState("a name was written without a value"));
        }
        let scope = match self.stack.last() {
            Some(Frame::Document) => false,
            Some(Frame::ScopeDocument) => true,
            _ => {
                cold_path();
                return Err(Error::InvalidState("no open document to end"));
            }
        };
        self.stack.pop();
        if scope {
            self.stack.pop();
        }
        self.close_root();
        Ok(Closed { scope })
    }

    pub(crate) fn close_array(&mut self) -> Result<()> {
        if !matches!(self.stack.last(), Some(Frame::Array { .. })) {
            cold_path();
            return Err(Error::InvalidState("no open array to end"));
        }
        self.stack.pop();
        self.close_root();
        Ok(())
    }

    /// Marks an encoded document or array copied at `position` as complete.
    pub(crate) fn close_encoded(&mut self, position: &Position) {
        if *position == Position::Root {
            self.finished = true;
        }
        if *position == Position::Scope {
            self.stack.pop();
            self.close_root();
        }
    }

    fn close_root(&mut self) {
        if self.stack.is_empty() {
            self.finished = true;
        }
    }
}
