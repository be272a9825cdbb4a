use zerocopy::byteorder;

use crate::{
    Array, Binary, BinarySubtype, BsonValue, DateTime, Decimal128, Document, Element, Error, Kind,
    ObjectId, Regex, Result, Timestamp, Value, cold_path, document::ElementList, util::LE,
};

/// Maximum nesting of documents and arrays accepted when decoding.
pub const MAX_DEPTH: usize = 128;

/// A forward cursor over encoded BSON bytes.
///
/// Every read checks bounds first and fails with [`Error::EndOfFile`] rather
/// than reading past the end of the slice.
#[derive(Clone)]
pub struct BsonReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BsonReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    #[inline]
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            cold_path();
            return Err(Error::EndOfFile);
        }
        let bytes = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(bytes)
    }

    #[inline]
    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(byteorder::I32::<LE>::from_bytes(self.array()?).get())
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(byteorder::I64::<LE>::from_bytes(self.array()?).get())
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(byteorder::U64::<LE>::from_bytes(self.array()?).get())
    }

    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(byteorder::F64::<LE>::from_bytes(self.array()?).get())
    }

    /// Reads a type byte, or `None` at a document terminator.
    pub fn read_kind(&mut self) -> Result<Option<Kind>> {
        match self.read_u8()? {
            0 => Ok(None),
            byte => match Kind::from_u8(byte) {
                Some(kind) => Ok(Some(kind)),
                None => {
                    cold_path();
                    Err(Error::InvalidKind(byte))
                }
            },
        }
    }

    /// Reads a NUL-terminated UTF-8 string.
    pub fn read_cstr(&mut self) -> Result<&'a str> {
        let rest = &self.data[self.position..];
        let Some(end) = rest.iter().position(|&b| b == 0) else {
            cold_path();
            return Err(Error::EndOfFile);
        };
        let text = std::str::from_utf8(&rest[..end]).map_err(|_| Error::InvalidUtf8)?;
        self.position += end + 1;
        Ok(text)
    }

    /// Reads an `int32` byte count (including the trailing NUL), the UTF-8
    /// bytes, and the NUL.
    pub fn read_string(&mut self) -> Result<&'a str> {
        let len = self.read_i32()?;
        if len < 1 {
            cold_path();
            return Err(Error::InvalidLength(len as i64));
        }
        let bytes = self.take(len as usize)?;
        let (text, terminator) = bytes.split_at(bytes.len() - 1);
        if terminator != [0] {
            cold_path();
            return Err(Error::Malformed("string is not NUL-terminated"));
        }
        std::str::from_utf8(text).map_err(|_| Error::InvalidUtf8)
    }

    /// Reads a self-length-prefixed block (document, array, or code with
    /// scope) and returns all of its bytes, prefix included.
    pub fn read_length_prefixed(&mut self, min: usize) -> Result<&'a [u8]> {
        let mut peek = self.clone();
        let len = peek.read_i32()?;
        if len < min as i32 {
            cold_path();
            return Err(Error::InvalidLength(len as i64));
        }
        self.take(len as usize)
    }

    pub fn read_binary(&mut self) -> Result<Binary> {
        let len = self.read_i32()?;
        if len < 0 {
            cold_path();
            return Err(Error::InvalidLength(len as i64));
        }
        let subtype = BinarySubtype::from(self.read_u8()?);
        let mut bytes = self.take(len as usize)?;
        if subtype == BinarySubtype::BinaryOld && bytes.len() >= 4 {
            let mut inner = BsonReader::new(bytes);
            if inner.read_i32()? as usize == bytes.len() - 4 {
                bytes = &bytes[4..];
            }
        }
        Ok(Binary::new(subtype, bytes))
    }

    pub fn read_object_id(&mut self) -> Result<ObjectId> {
        Ok(ObjectId::from_bytes(self.array()?))
    }

    pub fn read_decimal128(&mut self) -> Result<Decimal128> {
        Ok(Decimal128::from_bytes(self.array()?))
    }

    pub fn read_boolean(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => {
                cold_path();
                Err(Error::Malformed("boolean byte must be 0 or 1"))
            }
        }
    }

    pub fn read_regex(&mut self) -> Result<Regex> {
        let pattern = self.read_cstr()?;
        let options = self.read_cstr()?;
        Ok(Regex::new(pattern, options))
    }

    /// Reads a value of a kind whose payload does not nest other values.
    pub fn read_scalar(&mut self, kind: Kind) -> Result<BsonValue> {
        Ok(match kind {
            Kind::Double => BsonValue::Double(self.read_f64()?),
            Kind::String => BsonValue::String(self.read_string()?.to_owned()),
            Kind::Binary => BsonValue::Binary(self.read_binary()?),
            Kind::ObjectId => BsonValue::ObjectId(self.read_object_id()?),
            Kind::Boolean => BsonValue::Boolean(self.read_boolean()?),
            Kind::DateTime => BsonValue::DateTime(DateTime::from_millis(self.read_i64()?)),
            Kind::Null => BsonValue::Null,
            Kind::RegularExpression => BsonValue::RegularExpression(self.read_regex()?),
            Kind::JavaScript => BsonValue::JavaScript(self.read_string()?.to_owned()),
            Kind::Symbol => BsonValue::Symbol(self.read_string()?.to_owned()),
            Kind::Int32 => BsonValue::Int32(self.read_i32()?),
            Kind::Timestamp => BsonValue::Timestamp(Timestamp::from_u64(self.read_u64()?)),
            Kind::Int64 => BsonValue::Int64(self.read_i64()?),
            Kind::Decimal128 => BsonValue::Decimal128(self.read_decimal128()?),
            Kind::MaxKey => BsonValue::MaxKey,
            Kind::MinKey => BsonValue::MinKey,
            Kind::Document | Kind::Array | Kind::JavaScriptWithScope => {
                cold_path();
                return Err(Error::Malformed("nested value read as a scalar"));
            }
        })
    }

    /// Advances past one value without decoding it. Nested documents are
    /// skipped by their length prefix only.
    pub fn skip_value(&mut self, kind: Kind) -> Result<()> {
        match kind {
            Kind::Null | Kind::MinKey | Kind::MaxKey => {}
            Kind::Boolean => {
                self.take(1)?;
            }
            Kind::Int32 => {
                self.take(4)?;
            }
            Kind::Double | Kind::Int64 | Kind::DateTime | Kind::Timestamp => {
                self.take(8)?;
            }
            Kind::ObjectId => {
                self.take(12)?;
            }
            Kind::Decimal128 => {
                self.take(16)?;
            }
            Kind::String | Kind::JavaScript | Kind::Symbol => {
                self.read_string()?;
            }
            Kind::Binary => {
                let len = self.read_i32()?;
                if len < 0 {
                    cold_path();
                    return Err(Error::InvalidLength(len as i64));
                }
                self.take(len as usize + 1)?;
            }
            Kind::RegularExpression => {
                self.read_cstr()?;
                self.read_cstr()?;
            }
            Kind::Document | Kind::Array => {
                self.read_length_prefixed(5)?;
            }
            Kind::JavaScriptWithScope => {
                self.read_length_prefixed(14)?;
            }
        }
        Ok(())
    }

    /// Fully decodes one document into an owned tree.
    pub fn read_document(&mut self) -> Result<Document> {
        self.read_document_at(0)
    }

    /// Fully decodes one value of `kind` into an owned tree.
    pub fn read_value(&mut self, kind: Kind) -> Result<Value> {
        self.read_value_at(kind, 0)
    }

    fn read_document_at(&mut self, depth: usize) -> Result<Document> {
        let mut body = self.enter(depth)?;
        let mut list = ElementList::default();
        while let Some(kind) = body.read_kind()? {
            let name = body.read_cstr()?;
            let value = body.read_value_at(kind, depth + 1)?;
            list.push(Element::new(name, value));
        }
        body.finish()?;
        Ok(Document::from_list(list))
    }

    fn read_array_at(&mut self, depth: usize) -> Result<Array> {
        let mut body = self.enter(depth)?;
        let mut values = Vec::new();
        while let Some(kind) = body.read_kind()? {
            body.read_cstr()?;
            values.push(body.read_value_at(kind, depth + 1)?);
        }
        body.finish()?;
        Ok(Array::from(values))
    }

    fn read_value_at(&mut self, kind: Kind, depth: usize) -> Result<Value> {
        Ok(Value::new(match kind {
            Kind::Document => BsonValue::Document(self.read_document_at(depth)?),
            Kind::Array => BsonValue::Array(self.read_array_at(depth)?),
            Kind::JavaScriptWithScope => {
                let block = self.read_length_prefixed(14)?;
                let mut inner = BsonReader::new(&block[4..]);
                let code = inner.read_string()?.to_owned();
                let scope = inner.read_document_at(depth)?;
                if inner.remaining() != 0 {
                    cold_path();
                    return Err(Error::Malformed("code with scope length mismatch"));
                }
                BsonValue::JavaScriptWithScope { code, scope }
            }
            _ => self.read_scalar(kind)?,
        }))
    }

    /// Consumes a length-prefixed document and returns a reader over its
    /// element list (prefix stripped, terminator kept).
    pub(crate) fn enter(&mut self, depth: usize) -> Result<BsonReader<'a>> {
        if depth >= MAX_DEPTH {
            cold_path();
            return Err(Error::Malformed("nesting too deep"));
        }
        let block = self.read_length_prefixed(5)?;
        if block[block.len() - 1] != 0 {
            cold_path();
            return Err(Error::Malformed("document is not NUL-terminated"));
        }
        Ok(BsonReader::new(&block[4..]))
    }

    /// Checks that the terminator just read was the last byte.
    pub(crate) fn finish(&self) -> Result<()> {
        if self.remaining() != 0 {
            cold_path();
            return Err(Error::Malformed("document terminator before declared length"));
        }
        Ok(())
    }
}
