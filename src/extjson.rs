//! Parsing of Extended JSON v2, relaxed or canonical.
//!
//! Objects whose single key (or `$code` + `$scope` pair) names a wrapper
//! form are decoded as the matching kind; any other object, including one
//! with operator-style `$` keys, becomes an ordinary document.

use base64::Engine;
use serde_json::{Map, Value as Json};

use crate::{
    Array, Binary, BinarySubtype, BsonValue, DateTime, Decimal128, Document, Error, ObjectId,
    Regex, Result, Timestamp, Value, cold_path,
};

/// Parses one Extended JSON value of any kind.
///
/// # Example
///
/// ```
/// use na_bson::{Kind, extjson};
///
/// let value = extjson::from_str(r#"{"n":{"$numberLong":"5"},"id":{"$oid":"0123456789abcdef01234567"}}"#).unwrap();
/// let doc = value.as_document().unwrap();
/// assert_eq!(doc.get("n").unwrap().kind(), Kind::Int64);
/// assert_eq!(doc.get("id").unwrap().kind(), Kind::ObjectId);
/// ```
pub fn from_str(json: &str) -> Result<Value> {
    let parsed: Json =
        serde_json::from_str(json).map_err(|e| Error::Format(format!("invalid JSON: {e}")))?;
    from_json(&parsed)
}

/// Parses Extended JSON whose top level is a document.
pub fn document_from_str(json: &str) -> Result<Document> {
    let value = from_str(json)?;
    match value.into_inner() {
        BsonValue::Document(document) => Ok(document),
        other => {
            cold_path();
            Err(Error::TopLevelNotDocument(other.kind()))
        }
    }
}

/// Converts an already parsed JSON tree.
pub fn from_json(json: &Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::null(),
        Json::Bool(b) => Value::from(*b),
        Json::Number(n) => match n.as_i64() {
            Some(n) => match i32::try_from(n) {
                Ok(n) => Value::from(n),
                Err(_) => Value::from(n),
            },
            None => Value::from(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::from(s.as_str()),
        Json::Array(items) => {
            let values = items.iter().map(from_json).collect::<Result<Vec<_>>>()?;
            Value::from(Array::from(values))
        }
        Json::Object(map) => match wrapper_form(map)? {
            Some(value) => value,
            None => {
                let mut elements = Vec::with_capacity(map.len());
                for (name, value) in map {
                    elements.push((name.as_str(), from_json(value)?));
                }
                Value::from(elements.into_iter().collect::<Document>())
            }
        },
    })
}

impl Value {
    /// Parses Extended JSON. See [`extjson::from_str`](crate::extjson::from_str).
    pub fn from_extended_json(json: &str) -> Result<Value> {
        from_str(json)
    }
}

impl Document {
    /// Parses an Extended JSON document.
    ///
    /// ```
    /// use na_bson::{Document, JsonWriterSettings};
    ///
    /// let doc = Document::from_extended_json(r#"{"a":{"$numberInt":"1"},"b":[true,null]}"#).unwrap();
    /// assert_eq!(
    ///     doc.to_json_with(JsonWriterSettings::canonical()).unwrap(),
    ///     r#"{"a":{"$numberInt":"1"},"b":[true,null]}"#
    /// );
    /// ```
    pub fn from_extended_json(json: &str) -> Result<Document> {
        document_from_str(json)
    }
}

fn invalid(form: &str) -> Error {
    cold_path();
    Error::Format(format!("malformed {form} value"))
}

fn as_str<'a>(json: &'a Json, form: &str) -> Result<&'a str> {
    json.as_str().ok_or_else(|| invalid(form))
}

fn as_object<'a>(json: &'a Json, form: &str) -> Result<&'a Map<String, Json>> {
    json.as_object().ok_or_else(|| invalid(form))
}

fn as_u32(json: &Json, form: &str) -> Result<u32> {
    json.as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid(form))
}

fn field<'a>(map: &'a Map<String, Json>, name: &str, form: &str) -> Result<&'a Json> {
    map.get(name).ok_or_else(|| invalid(form))
}

/// Decodes `map` if it is one of the wrapper forms.
fn wrapper_form(map: &Map<String, Json>) -> Result<Option<Value>> {
    if map.len() == 2 && map.contains_key("$code") && map.contains_key("$scope") {
        let code = as_str(field(map, "$code", "$code")?, "$code")?;
        let scope = match from_json(field(map, "$scope", "$scope")?)?.into_inner() {
            BsonValue::Document(scope) => scope,
            _ => return Err(invalid("$scope")),
        };
        return Ok(Some(Value::new(BsonValue::JavaScriptWithScope {
            code: code.to_owned(),
            scope,
        })));
    }

    let mut entries = map.iter();
    let (Some((key, body)), None) = (entries.next(), entries.next()) else {
        return Ok(None);
    };

    let payload = match key.as_str() {
        "$oid" => BsonValue::ObjectId(ObjectId::parse_str(as_str(body, key)?)?),
        "$symbol" => BsonValue::Symbol(as_str(body, key)?.to_owned()),
        "$numberInt" => {
            let text = as_str(body, key)?;
            BsonValue::Int32(
                text.parse()
                    .map_err(|_| Error::Format(format!("'{text}' is not a valid Int32")))?,
            )
        }
        "$numberLong" => {
            let text = as_str(body, key)?;
            BsonValue::Int64(
                text.parse()
                    .map_err(|_| Error::Format(format!("'{text}' is not a valid Int64")))?,
            )
        }
        "$numberDouble" => BsonValue::Double(parse_double(as_str(body, key)?)?),
        "$numberDecimal" => BsonValue::Decimal128(Decimal128::parse(as_str(body, key)?)?),
        "$binary" => {
            let fields = as_object(body, key)?;
            let encoded = as_str(field(fields, "base64", key)?, key)?;
            let subtype = as_str(field(fields, "subType", key)?, key)?;
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| Error::Format(format!("invalid base64 payload: {e}")))?;
            let subtype = u8::from_str_radix(subtype, 16)
                .map_err(|_| Error::Format(format!("invalid binary subtype '{subtype}'")))?;
            BsonValue::Binary(Binary::new(BinarySubtype::from(subtype), bytes))
        }
        "$code" => BsonValue::JavaScript(as_str(body, key)?.to_owned()),
        "$timestamp" => {
            let fields = as_object(body, key)?;
            BsonValue::Timestamp(Timestamp::new(
                as_u32(field(fields, "t", key)?, key)?,
                as_u32(field(fields, "i", key)?, key)?,
            ))
        }
        "$regularExpression" => {
            let fields = as_object(body, key)?;
            BsonValue::RegularExpression(Regex::new(
                as_str(field(fields, "pattern", key)?, key)?,
                as_str(field(fields, "options", key)?, key)?,
            ))
        }
        "$date" => BsonValue::DateTime(parse_date(body)?),
        "$minKey" if body.as_i64() == Some(1) => BsonValue::MinKey,
        "$maxKey" if body.as_i64() == Some(1) => BsonValue::MaxKey,
        _ => return Ok(None),
    };
    Ok(Some(Value::new(payload)))
}

fn parse_double(text: &str) -> Result<f64> {
    match text {
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ => text
            .parse()
            .map_err(|_| Error::Format(format!("'{text}' is not a valid Double"))),
    }
}

fn parse_date(body: &Json) -> Result<DateTime> {
    match body {
        Json::String(text) => DateTime::parse_rfc3339(text),
        Json::Number(n) => n
            .as_i64()
            .map(DateTime::from_millis)
            .ok_or_else(|| invalid("$date")),
        Json::Object(fields) => {
            let text = as_str(field(fields, "$numberLong", "$date")?, "$date")?;
            text.parse()
                .map(DateTime::from_millis)
                .map_err(|_| Error::Format(format!("'{text}' is not a valid date")))
        }
        _ => Err(invalid("$date")),
    }
}
