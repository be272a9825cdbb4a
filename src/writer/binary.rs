use zerocopy::byteorder;

use crate::{
    Binary, BinarySubtype, BsonWriter, DateTime, Decimal128, Error, Kind, ObjectId, Regex, Result,
    Timestamp, cold_path,
    util::{EMPTY_DOCUMENT, LE},
    writer::{Position, WriterContext},
};

/// Encodes into the little-endian binary BSON layout.
///
/// Length prefixes are reserved when a document, array, or code-with-scope
/// value opens and filled in when it closes.
///
/// # Example
///
/// ```
/// use na_bson::{BinaryWriter, BsonWriter};
///
/// let mut writer = BinaryWriter::new();
/// writer.write_start_document().unwrap();
/// writer.write_name("a").unwrap();
/// writer.write_int32(1).unwrap();
/// writer.write_end_document().unwrap();
///
/// assert_eq!(
///     writer.into_bytes().unwrap(),
///     [12, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0]
/// );
/// ```
pub struct BinaryWriter {
    buf: Vec<u8>,
    context: WriterContext,
    /// Offsets of length prefixes still to be filled in.
    open: Vec<usize>,
}

impl Default for BinaryWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::with_capacity(128)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity.max(EMPTY_DOCUMENT.len())),
            context: WriterContext::new(),
            open: Vec::new(),
        }
    }

    /// The encoded document. Fails unless exactly one complete document
    /// was written.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if !self.context.is_finished() {
            cold_path();
            return Err(Error::InvalidState("document is not complete"));
        }
        Ok(self.buf)
    }

    #[inline]
    fn put_i32(&mut self, value: i32) {
        self.buf
            .extend_from_slice(&byteorder::I32::<LE>::new(value).to_bytes());
    }

    #[inline]
    fn put_i64(&mut self, value: i64) {
        self.buf
            .extend_from_slice(&byteorder::I64::<LE>::new(value).to_bytes());
    }

    fn put_cstr(&mut self, text: &str) -> Result<()> {
        if text.as_bytes().contains(&0) {
            cold_path();
            return Err(Error::Malformed("names and patterns cannot contain NUL"));
        }
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    fn put_string(&mut self, text: &str) -> Result<()> {
        let len = i32::try_from(text.len() + 1).map_err(|_| Error::InvalidLength(text.len() as i64))?;
        self.put_i32(len);
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    /// Claims the next slot and writes the element header for it.
    fn begin(&mut self, kind: Kind) -> Result<Position> {
        let position = self.context.next_value(kind)?;
        if let Position::Element(name) = &position {
            self.buf.push(kind as u8);
            self.put_cstr(name)?;
        }
        Ok(position)
    }

    fn reserve_length(&mut self) {
        self.open.push(self.buf.len());
        self.put_i32(0);
    }

    fn patch_length(&mut self) -> Result<()> {
        let Some(start) = self.open.pop() else {
            cold_path();
            return Err(Error::InvalidState("no open length prefix"));
        };
        let len = i32::try_from(self.buf.len() - start)
            .map_err(|_| Error::InvalidLength((self.buf.len() - start) as i64))?;
        self.buf[start..start + 4].copy_from_slice(&byteorder::I32::<LE>::new(len).to_bytes());
        Ok(())
    }

    fn scalar(&mut self, kind: Kind, payload: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.begin(kind)?;
        payload(self)
    }
}

impl BsonWriter for BinaryWriter {
    fn write_start_document(&mut self) -> Result<()> {
        let position = self.begin(Kind::Document)?;
        self.context.open_document(&position);
        self.reserve_length();
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<()> {
        let closed = self.context.close_document()?;
        self.buf.push(0);
        self.patch_length()?;
        if closed.scope {
            self.patch_length()?;
        }
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.begin(Kind::Array)?;
        self.context.open_array();
        self.reserve_length();
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.context.close_array()?;
        self.buf.push(0);
        self.patch_length()
    }

    fn write_name(&mut self, name: &str) -> Result<()> {
        self.context.write_name(name)
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        self.scalar(Kind::Double, |w| {
            w.buf
                .extend_from_slice(&byteorder::F64::<LE>::new(value).to_bytes());
            Ok(())
        })
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.scalar(Kind::String, |w| w.put_string(value))
    }

    fn write_symbol(&mut self, value: &str) -> Result<()> {
        self.scalar(Kind::Symbol, |w| w.put_string(value))
    }

    fn write_binary(&mut self, value: &Binary) -> Result<()> {
        self.scalar(Kind::Binary, |w| {
            let old = value.subtype == BinarySubtype::BinaryOld;
            let len = value.bytes.len() + if old { 4 } else { 0 };
            let len = i32::try_from(len).map_err(|_| Error::InvalidLength(len as i64))?;
            w.put_i32(len);
            w.buf.push(value.subtype.into());
            if old {
                w.put_i32(len - 4);
            }
            w.buf.extend_from_slice(&value.bytes);
            Ok(())
        })
    }

    fn write_object_id(&mut self, value: ObjectId) -> Result<()> {
        self.scalar(Kind::ObjectId, |w| {
            w.buf.extend_from_slice(&value.bytes());
            Ok(())
        })
    }

    fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.scalar(Kind::Boolean, |w| {
            w.buf.push(value as u8);
            Ok(())
        })
    }

    fn write_date_time(&mut self, value: DateTime) -> Result<()> {
        self.scalar(Kind::DateTime, |w| {
            w.put_i64(value.timestamp_millis());
            Ok(())
        })
    }

    fn write_null(&mut self) -> Result<()> {
        self.scalar(Kind::Null, |_| Ok(()))
    }

    fn write_regular_expression(&mut self, value: &Regex) -> Result<()> {
        self.scalar(Kind::RegularExpression, |w| {
            w.put_cstr(&value.pattern)?;
            w.put_cstr(&value.options)
        })
    }

    fn write_javascript(&mut self, code: &str) -> Result<()> {
        self.scalar(Kind::JavaScript, |w| w.put_string(code))
    }

    fn write_javascript_with_scope(&mut self, code: &str) -> Result<()> {
        self.begin(Kind::JavaScriptWithScope)?;
        self.context.open_scope();
        self.reserve_length();
        self.put_string(code)
    }

    fn write_int32(&mut self, value: i32) -> Result<()> {
        self.scalar(Kind::Int32, |w| {
            w.put_i32(value);
            Ok(())
        })
    }

    fn write_timestamp(&mut self, value: Timestamp) -> Result<()> {
        self.scalar(Kind::Timestamp, |w| {
            w.buf
                .extend_from_slice(&byteorder::U64::<LE>::new(value.to_u64()).to_bytes());
            Ok(())
        })
    }

    fn write_int64(&mut self, value: i64) -> Result<()> {
        self.scalar(Kind::Int64, |w| {
            w.put_i64(value);
            Ok(())
        })
    }

    fn write_decimal128(&mut self, value: Decimal128) -> Result<()> {
        self.scalar(Kind::Decimal128, |w| {
            w.buf.extend_from_slice(&value.bytes());
            Ok(())
        })
    }

    fn write_min_key(&mut self) -> Result<()> {
        self.scalar(Kind::MinKey, |_| Ok(()))
    }

    fn write_max_key(&mut self) -> Result<()> {
        self.scalar(Kind::MaxKey, |_| Ok(()))
    }

    fn write_encoded(&mut self, kind: Kind, bytes: &[u8]) -> Result<bool> {
        let position = self.begin(kind)?;
        self.buf.extend_from_slice(bytes);
        self.context.close_encoded(&position);
        if position == Position::Scope {
            self.patch_length()?;
        }
        Ok(true)
    }
}
