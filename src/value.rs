use std::{fmt, ops::Deref, sync::Arc};

use crate::{
    Array, Binary, DateTime, Decimal128, Document, JsonWriterSettings, Kind, ObjectId, Regex,
    Result, Timestamp, cache,
};

/// The payload of a BSON value: one variant per [`Kind`].
///
/// Values are usually handled through the shared [`Value`] handle, which
/// dereferences to this enum for pattern matching.
#[derive(Clone, Debug)]
pub enum BsonValue {
    MinKey,
    Null,
    Int32(i32),
    Int64(i64),
    Double(f64),
    Decimal128(Decimal128),
    String(String),
    Symbol(String),
    Document(Document),
    Array(Array),
    Binary(Binary),
    ObjectId(ObjectId),
    Boolean(bool),
    DateTime(DateTime),
    Timestamp(Timestamp),
    RegularExpression(Regex),
    JavaScript(String),
    JavaScriptWithScope { code: String, scope: Document },
    MaxKey,
}

impl BsonValue {
    #[inline]
    pub fn kind(&self) -> Kind {
        match self {
            BsonValue::MinKey => Kind::MinKey,
            BsonValue::Null => Kind::Null,
            BsonValue::Int32(_) => Kind::Int32,
            BsonValue::Int64(_) => Kind::Int64,
            BsonValue::Double(_) => Kind::Double,
            BsonValue::Decimal128(_) => Kind::Decimal128,
            BsonValue::String(_) => Kind::String,
            BsonValue::Symbol(_) => Kind::Symbol,
            BsonValue::Document(_) => Kind::Document,
            BsonValue::Array(_) => Kind::Array,
            BsonValue::Binary(_) => Kind::Binary,
            BsonValue::ObjectId(_) => Kind::ObjectId,
            BsonValue::Boolean(_) => Kind::Boolean,
            BsonValue::DateTime(_) => Kind::DateTime,
            BsonValue::Timestamp(_) => Kind::Timestamp,
            BsonValue::RegularExpression(_) => Kind::RegularExpression,
            BsonValue::JavaScript(_) => Kind::JavaScript,
            BsonValue::JavaScriptWithScope { .. } => Kind::JavaScriptWithScope,
            BsonValue::MaxKey => Kind::MaxKey,
        }
    }

    /// Recursively copies every nested document and array.
    pub fn deep_clone(&self) -> BsonValue {
        match self {
            BsonValue::Document(document) => BsonValue::Document(document.deep_clone()),
            BsonValue::Array(array) => BsonValue::Array(array.deep_clone()),
            BsonValue::JavaScriptWithScope { code, scope } => BsonValue::JavaScriptWithScope {
                code: code.clone(),
                scope: scope.deep_clone(),
            },
            other => other.clone(),
        }
    }
}

/// A shared, immutable handle to a [`BsonValue`].
///
/// Cloning a `Value` shares the payload; [`Value::ptr_eq`] observes that
/// identity. Numeric values inside the interned range, `null`, booleans,
/// and the min/max keys are process-wide singletons. Mutation goes through
/// [`Value::make_mut`], which copies the payload first if it is shared.
///
/// # Example
///
/// ```
/// use na_bson::Value;
///
/// let a = Value::from(50);
/// let b = Value::from(50);
/// assert!(Value::ptr_eq(&a, &b));
///
/// assert_eq!(Value::from(1), Value::from(1.0));
/// ```
#[derive(Clone)]
pub struct Value(Arc<BsonValue>);

impl Value {
    /// Wraps a payload, returning the interned singleton when one exists.
    pub fn new(payload: BsonValue) -> Self {
        match cache::interned(&payload) {
            Some(value) => value,
            None => Self::allocate(payload),
        }
    }

    /// Wraps a payload in a fresh allocation, bypassing the interning cache.
    #[inline]
    pub(crate) fn allocate(payload: BsonValue) -> Self {
        Self(Arc::new(payload))
    }

    pub fn null() -> Self {
        cache::null()
    }

    pub fn min_key() -> Self {
        Self::new(BsonValue::MinKey)
    }

    pub fn max_key() -> Self {
        Self::new(BsonValue::MaxKey)
    }

    /// Returns `true` if both handles point at the same payload.
    #[inline]
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.0, &other.0)
    }

    /// Mutable access to the payload, copying it first if it is shared.
    ///
    /// Copying a document or array payload is shallow: nested values stay
    /// shared until they are themselves made mutable.
    pub fn make_mut(&mut self) -> &mut BsonValue {
        Arc::make_mut(&mut self.0)
    }

    pub fn into_inner(self) -> BsonValue {
        Arc::unwrap_or_clone(self.0)
    }

    /// Recursively copies every nested document and array.
    pub fn deep_clone(&self) -> Value {
        match &*self.0 {
            BsonValue::Document(_) | BsonValue::Array(_) | BsonValue::JavaScriptWithScope { .. } => {
                Value::allocate(self.0.deep_clone())
            }
            _ => Value::new(self.0.deep_clone()),
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(*self.0, BsonValue::Null)
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    #[inline]
    pub fn as_i32(&self) -> Option<i32> {
        match *self.0 {
            BsonValue::Int32(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match *self.0 {
            BsonValue::Int64(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match *self.0 {
            BsonValue::Double(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_decimal128(&self) -> Option<Decimal128> {
        match *self.0 {
            BsonValue::Decimal128(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match *self.0 {
            BsonValue::Boolean(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match &*self.0 {
            BsonValue::String(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_symbol(&self) -> Option<&str> {
        match &*self.0 {
            BsonValue::Symbol(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_document(&self) -> Option<&Document> {
        match &*self.0 {
            BsonValue::Document(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&Array> {
        match &*self.0 {
            BsonValue::Array(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_binary(&self) -> Option<&Binary> {
        match &*self.0 {
            BsonValue::Binary(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match *self.0 {
            BsonValue::ObjectId(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_date_time(&self) -> Option<DateTime> {
        match *self.0 {
            BsonValue::DateTime(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match *self.0 {
            BsonValue::Timestamp(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_regex(&self) -> Option<&Regex> {
        match &*self.0 {
            BsonValue::RegularExpression(value) => Some(value),
            _ => None,
        }
    }

    #[inline]
    pub fn as_javascript(&self) -> Option<&str> {
        match &*self.0 {
            BsonValue::JavaScript(code) | BsonValue::JavaScriptWithScope { code, .. } => {
                Some(code)
            }
            _ => None,
        }
    }

    /// Mutable access to a document payload, copying it first if shared.
    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self.make_mut() {
            BsonValue::Document(document) => Some(document),
            _ => None,
        }
    }

    /// Mutable access to an array payload, copying it first if shared.
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self.make_mut() {
            BsonValue::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Renders this value as relaxed Extended JSON.
    pub fn to_json(&self) -> String {
        self.to_string()
    }

    pub fn to_json_with(&self, settings: JsonWriterSettings) -> Result<String> {
        crate::JsonWriter::render_value(self, settings)
    }
}

impl Deref for Value {
    type Target = BsonValue;

    #[inline]
    fn deref(&self) -> &BsonValue {
        &self.0
    }
}

impl AsRef<BsonValue> for Value {
    fn as_ref(&self) -> &BsonValue {
        &self.0
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = crate::JsonWriter::render_value(self, JsonWriterSettings::default())
            .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl From<BsonValue> for Value {
    fn from(payload: BsonValue) -> Self {
        Self::new(payload)
    }
}

macro_rules! impl_from_host {
    ($($host:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$host> for Value {
                #[inline]
                fn from(value: $host) -> Self {
                    Self::new(BsonValue::$variant(value $(as $cast)?))
                }
            }
        )*
    };
}

impl_from_host!(
    i8 => Int32 as i32,
    i16 => Int32 as i32,
    i32 => Int32,
    u8 => Int32 as i32,
    u16 => Int32 as i32,
    u32 => Int64 as i64,
    i64 => Int64,
    f32 => Double as f64,
    f64 => Double,
    bool => Boolean,
    String => String,
    Decimal128 => Decimal128,
    Document => Document,
    Array => Array,
    Binary => Binary,
    ObjectId => ObjectId,
    DateTime => DateTime,
    Timestamp => Timestamp,
    Regex => RegularExpression,
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::new(BsonValue::String(value.to_owned()))
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::new(BsonValue::String(value.clone()))
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Value {
    fn from(value: chrono::DateTime<chrono::Utc>) -> Self {
        Self::new(BsonValue::DateTime(value.into()))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::new(BsonValue::Array(values.into_iter().collect()))
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}
