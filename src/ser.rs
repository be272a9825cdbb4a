use std::io::Write;

use serde::{Serialize, ser};

use crate::{
    Binary, BinaryWriter, BsonWriter, Document, Error, Result, Value, ValueBuilder, cold_path,
};

/// Serde serializer that drives any [`BsonWriter`].
///
/// Host types map onto kinds as follows: `bool` to Boolean; `i8`, `i16`,
/// `i32`, `u8`, `u16` to Int32; `i64`, `u32`, and `u64` (when it fits) to
/// Int64; floats to Double; `char` and strings to String; byte slices to
/// generic Binary; `None`, `()`, and unit structs to Null; sequences and
/// tuples to Array; maps and structs to Document. Enum variants with data
/// become a single-element document keyed by the variant name.
///
/// For most use cases, prefer the convenience functions [`to_document`],
/// [`to_value`], and [`to_vec`].
pub struct Serializer<'w> {
    writer: &'w mut dyn BsonWriter,
}

impl<'w> Serializer<'w> {
    pub fn new(writer: &'w mut dyn BsonWriter) -> Self {
        Self { writer }
    }
}

/// Serialize `value` into `writer`.
#[inline]
pub fn serialize_into(writer: &mut dyn BsonWriter, value: &(impl ?Sized + Serialize)) -> Result<()> {
    value.serialize(&mut Serializer::new(writer))
}

/// Serialize a value into an owned document.
///
/// # Errors
///
/// Returns [`Error::TopLevelNotDocument`] if `value` does not serialize as a
/// map or struct, and [`Error::KeyMustBeString`] for maps with non-string
/// keys.
///
/// # Example
///
/// ```
/// use na_bson::{Value, ser::to_document};
///
/// #[derive(serde::Serialize)]
/// struct Item { id: u32, tags: Vec<&'static str> }
///
/// let doc = to_document(&Item { id: 7, tags: vec!["a", "b"] }).unwrap();
/// assert_eq!(doc.get("id"), Some(Value::from(7i64)));
/// ```
pub fn to_document(value: &(impl ?Sized + Serialize)) -> Result<Document> {
    let mut builder = ValueBuilder::new();
    serialize_into(&mut builder, value)?;
    builder.into_document()
}

/// Serialize a value of any shape into a [`Value`].
pub fn to_value(value: &(impl ?Sized + Serialize)) -> Result<Value> {
    let mut builder = ValueBuilder::for_value();
    serialize_into(&mut builder, value)?;
    builder.into_value()
}

/// Serialize a value to encoded bytes. The value must serialize as a
/// document.
pub fn to_vec(value: &(impl ?Sized + Serialize)) -> Result<Vec<u8>> {
    let mut writer = BinaryWriter::new();
    serialize_into(&mut writer, value)?;
    writer.into_bytes()
}

/// Serialize a value to an [`std::io::Write`] implementation.
///
/// The value is encoded into an internal buffer first, then written in one
/// call.
pub fn to_writer(writer: &mut impl Write, value: &(impl ?Sized + Serialize)) -> Result<()> {
    let vec = to_vec(value)?;
    writer.write_all(&vec).map_err(Error::IO)
}

impl Value {
    /// Builds a value from any serializable host value.
    ///
    /// ```
    /// use na_bson::{Kind, Value};
    ///
    /// assert_eq!(Value::create(&Some(3)).unwrap(), Value::from(3));
    /// assert_eq!(Value::create(&None::<i32>).unwrap().kind(), Kind::Null);
    /// assert_eq!(Value::create(&[1, 2]).unwrap().kind(), Kind::Array);
    /// ```
    pub fn create(value: &(impl ?Sized + Serialize)) -> Result<Value> {
        to_value(value)
    }
}

impl<'a, 'w> ser::Serializer for &'a mut Serializer<'w> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    #[inline]
    fn serialize_bool(self, v: bool) -> Result<()> {
        self.writer.write_boolean(v)
    }

    #[inline]
    fn serialize_i8(self, v: i8) -> Result<()> {
        self.writer.write_int32(v as i32)
    }

    #[inline]
    fn serialize_i16(self, v: i16) -> Result<()> {
        self.writer.write_int32(v as i32)
    }

    #[inline]
    fn serialize_i32(self, v: i32) -> Result<()> {
        self.writer.write_int32(v)
    }

    #[inline]
    fn serialize_i64(self, v: i64) -> Result<()> {
        self.writer.write_int64(v)
    }

    #[inline]
    fn serialize_u8(self, v: u8) -> Result<()> {
        self.writer.write_int32(v as i32)
    }

    #[inline]
    fn serialize_u16(self, v: u16) -> Result<()> {
        self.writer.write_int32(v as i32)
    }

    #[inline]
    fn serialize_u32(self, v: u32) -> Result<()> {
        self.writer.write_int64(v as i64)
    }

    #[inline]
    fn serialize_u64(self, v: u64) -> Result<()> {
        match i64::try_from(v) {
            Ok(v) => self.writer.write_int64(v),
            Err(_) => {
                cold_path();
                Err(Error::Overflow { to: "Int64" })
            }
        }
    }

    #[inline]
    fn serialize_f32(self, v: f32) -> Result<()> {
        self.writer.write_double(v as f64)
    }

    #[inline]
    fn serialize_f64(self, v: f64) -> Result<()> {
        self.writer.write_double(v)
    }

    #[inline]
    fn serialize_char(self, v: char) -> Result<()> {
        self.writer.write_string(v.encode_utf8(&mut [0u8; 4]))
    }

    #[inline]
    fn serialize_str(self, v: &str) -> Result<()> {
        self.writer.write_string(v)
    }

    #[inline]
    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.writer.write_binary(&Binary::generic(v))
    }

    #[inline]
    fn serialize_none(self) -> Result<()> {
        self.writer.write_null()
    }

    #[inline]
    fn serialize_some<T>(self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    #[inline]
    fn serialize_unit(self) -> Result<()> {
        self.writer.write_null()
    }

    #[inline]
    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.writer.write_null()
    }

    #[inline]
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.writer.write_string(variant)
    }

    #[inline]
    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.writer.write_start_document()?;
        self.writer.write_name(variant)?;
        value.serialize(&mut *self)?;
        self.writer.write_end_document()
    }

    #[inline]
    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.writer.write_start_array()?;
        Ok(self)
    }

    #[inline]
    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    #[inline]
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.writer.write_start_document()?;
        self.writer.write_name(variant)?;
        self.writer.write_start_array()?;
        Ok(self)
    }

    #[inline]
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.writer.write_start_document()?;
        Ok(self)
    }

    #[inline]
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        self.writer.write_start_document()?;
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.writer.write_start_document()?;
        self.writer.write_name(variant)?;
        self.writer.write_start_document()?;
        Ok(self)
    }
}

impl ser::SerializeSeq for &mut Serializer<'_> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.writer.write_end_array()
    }
}

impl ser::SerializeTuple for &mut Serializer<'_> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.writer.write_end_array()
    }
}

impl ser::SerializeTupleStruct for &mut Serializer<'_> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.writer.write_end_array()
    }
}

impl ser::SerializeTupleVariant for &mut Serializer<'_> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.writer.write_end_array()?;
        self.writer.write_end_document()
    }
}

impl ser::SerializeMap for &mut Serializer<'_> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        key.serialize(MapKeySerializer {
            writer: &mut *self.writer,
        })
    }

    #[inline]
    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.writer.write_end_document()
    }
}

impl ser::SerializeStruct for &mut Serializer<'_> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.writer.write_name(key)?;
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.writer.write_end_document()
    }
}

impl ser::SerializeStructVariant for &mut Serializer<'_> {
    type Ok = ();
    type Error = Error;

    #[inline]
    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.writer.write_name(key)?;
        value.serialize(&mut **self)
    }

    #[inline]
    fn end(self) -> Result<()> {
        self.writer.write_end_document()?;
        self.writer.write_end_document()
    }
}

/// Writes map keys as element names; anything but a string is rejected.
struct MapKeySerializer<'a> {
    writer: &'a mut dyn BsonWriter,
}

macro_rules! reject_key {
    ($($method:ident($($arg:ty),*);)*) => {
        $(
            #[inline]
            fn $method(self, $(_: $arg),*) -> Result<()> {
                cold_path();
                Err(Error::KeyMustBeString)
            }
        )*
    };
}

impl ser::Serializer for MapKeySerializer<'_> {
    type Ok = ();
    type Error = Error;

    type SerializeSeq = ser::Impossible<(), Error>;
    type SerializeTuple = ser::Impossible<(), Error>;
    type SerializeTupleStruct = ser::Impossible<(), Error>;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = ser::Impossible<(), Error>;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    #[inline]
    fn serialize_str(self, v: &str) -> Result<()> {
        self.writer.write_name(v)
    }

    #[inline]
    fn serialize_char(self, v: char) -> Result<()> {
        self.writer.write_name(v.encode_utf8(&mut [0u8; 4]))
    }

    #[inline]
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.writer.write_name(variant)
    }

    #[inline]
    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    reject_key! {
        serialize_bool(bool);
        serialize_i8(i8);
        serialize_i16(i16);
        serialize_i32(i32);
        serialize_i64(i64);
        serialize_u8(u8);
        serialize_u16(u16);
        serialize_u32(u32);
        serialize_u64(u64);
        serialize_f32(f32);
        serialize_f64(f64);
        serialize_bytes(&[u8]);
        serialize_none();
        serialize_unit();
        serialize_unit_struct(&'static str);
    }

    fn serialize_some<T>(self, _value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        cold_path();
        Err(Error::KeyMustBeString)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        cold_path();
        Err(Error::KeyMustBeString)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        cold_path();
        Err(Error::KeyMustBeString)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        cold_path();
        Err(Error::KeyMustBeString)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        cold_path();
        Err(Error::KeyMustBeString)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        cold_path();
        Err(Error::KeyMustBeString)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        cold_path();
        Err(Error::KeyMustBeString)
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        cold_path();
        Err(Error::KeyMustBeString)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        cold_path();
        Err(Error::KeyMustBeString)
    }
}
