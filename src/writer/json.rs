use std::fmt::Write as _;

use crate::{
    Array, Binary, BsonWriter, DateTime, Decimal128, Document, Error, Kind, ObjectId, Regex, Result,
    Timestamp, Value, cold_path,
    writer::{Position, WriterContext, write_array, write_document, write_value},
};

/// The Extended JSON v2 flavour to produce.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum JsonOutputMode {
    /// Plain JSON numbers and ISO-8601 dates where that loses no type
    /// information a reader cares about.
    #[default]
    Relaxed,
    /// Every number and date wrapped so its exact kind survives a round trip.
    Canonical,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct JsonWriterSettings {
    pub mode: JsonOutputMode,
    /// Break lines and indent nested containers by two spaces.
    pub indent: bool,
}

impl JsonWriterSettings {
    pub const fn relaxed() -> Self {
        Self {
            mode: JsonOutputMode::Relaxed,
            indent: false,
        }
    }

    pub const fn canonical() -> Self {
        Self {
            mode: JsonOutputMode::Canonical,
            indent: false,
        }
    }

    pub const fn with_indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }
}

/// Last millisecond of the year 9999.
const MAX_ISO_DATE: i64 = 253_402_300_799_999;

/// Renders Extended JSON v2.
///
/// # Example
///
/// ```
/// use na_bson::{Document, JsonWriterSettings, Value};
///
/// let doc: Document = [("n", Value::from(1i64))].into_iter().collect();
/// assert_eq!(doc.to_json(), r#"{"n":1}"#);
/// assert_eq!(
///     doc.to_json_with(JsonWriterSettings::canonical()).unwrap(),
///     r#"{"n":{"$numberLong":"1"}}"#
/// );
/// ```
pub struct JsonWriter {
    out: String,
    settings: JsonWriterSettings,
    context: WriterContext,
    /// Elements written so far in each open document or array.
    counts: Vec<usize>,
}

impl JsonWriter {
    /// A writer for one top-level document.
    pub fn new(settings: JsonWriterSettings) -> Self {
        Self::with_context(settings, WriterContext::new())
    }

    fn with_context(settings: JsonWriterSettings, context: WriterContext) -> Self {
        Self {
            out: String::new(),
            settings,
            context,
            counts: Vec::new(),
        }
    }

    pub fn into_string(self) -> Result<String> {
        if !self.context.is_finished() {
            cold_path();
            return Err(Error::InvalidState("JSON output is not complete"));
        }
        Ok(self.out)
    }

    pub(crate) fn render_value(value: &Value, settings: JsonWriterSettings) -> Result<String> {
        let mut writer = Self::with_context(settings, WriterContext::any_root());
        write_value(&mut writer, value)?;
        writer.into_string()
    }

    pub(crate) fn render_document(document: &Document, settings: JsonWriterSettings) -> Result<String> {
        let mut writer = Self::new(settings);
        write_document(&mut writer, document)?;
        writer.into_string()
    }

    pub(crate) fn render_array(array: &Array, settings: JsonWriterSettings) -> Result<String> {
        let mut writer = Self::with_context(settings, WriterContext::any_root());
        write_array(&mut writer, array)?;
        writer.into_string()
    }

    #[inline]
    fn relaxed(&self) -> bool {
        self.settings.mode == JsonOutputMode::Relaxed
    }

    fn newline(&mut self) {
        if self.settings.indent {
            self.out.push('\n');
            for _ in 0..self.counts.len() {
                self.out.push_str("  ");
            }
        }
    }

    fn push_quoted(&mut self, text: &str) -> Result<()> {
        let quoted = serde_json::to_string(text).map_err(|e| Error::Message(e.to_string()))?;
        self.out.push_str(&quoted);
        Ok(())
    }

    fn push_key(&mut self, key: &str) -> Result<()> {
        self.push_quoted(key)?;
        self.out.push(':');
        if self.settings.indent {
            self.out.push(' ');
        }
        Ok(())
    }

    /// Claims the next slot and writes the separator and name for it.
    fn begin(&mut self, kind: Kind) -> Result<Position> {
        let in_array = self.context.in_array();
        let position = self.context.next_value(kind)?;
        match &position {
            Position::Root => {}
            Position::Element(name) => {
                if let Some(count) = self.counts.last_mut() {
                    if *count > 0 {
                        self.out.push(',');
                    }
                    *count += 1;
                }
                self.newline();
                if !in_array {
                    self.push_key(name)?;
                }
            }
            Position::Scope => {
                self.out.push(',');
                self.push_key("$scope")?;
            }
        }
        Ok(position)
    }

    fn open(&mut self, bracket: char) {
        self.out.push(bracket);
        self.counts.push(0);
    }

    fn close(&mut self, bracket: char) {
        let count = self.counts.pop().unwrap_or(0);
        if count > 0 {
            self.newline();
        }
        self.out.push(bracket);
    }

    /// Writes `{"<key>":<body>}` as the next value.
    fn wrapped(&mut self, kind: Kind, key: &str, body: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        self.begin(kind)?;
        self.out.push('{');
        self.push_quoted(key)?;
        self.out.push(':');
        body(self)?;
        self.out.push('}');
        Ok(())
    }

    fn wrapped_str(&mut self, kind: Kind, key: &str, text: &str) -> Result<()> {
        self.wrapped(kind, key, |w| w.push_quoted(text))
    }
}

fn format_double(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
    } else {
        format!("{value:?}")
    }
}

impl BsonWriter for JsonWriter {
    fn write_start_document(&mut self) -> Result<()> {
        let position = self.begin(Kind::Document)?;
        self.context.open_document(&position);
        self.open('{');
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<()> {
        let closed = self.context.close_document()?;
        self.close('}');
        if closed.scope {
            self.out.push('}');
        }
        Ok(())
    }

    fn write_start_array(&mut self) -> Result<()> {
        self.begin(Kind::Array)?;
        self.context.open_array();
        self.open('[');
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.context.close_array()?;
        self.close(']');
        Ok(())
    }

    fn write_name(&mut self, name: &str) -> Result<()> {
        self.context.write_name(name)
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        if self.relaxed() && value.is_finite() {
            self.begin(Kind::Double)?;
            self.out.push_str(&format_double(value));
            return Ok(());
        }
        self.wrapped_str(Kind::Double, "$numberDouble", &format_double(value))
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.begin(Kind::String)?;
        self.push_quoted(value)
    }

    fn write_symbol(&mut self, value: &str) -> Result<()> {
        self.wrapped_str(Kind::Symbol, "$symbol", value)
    }

    fn write_binary(&mut self, value: &Binary) -> Result<()> {
        self.wrapped(Kind::Binary, "$binary", |w| {
            w.out.push_str("{\"base64\":");
            w.push_quoted(&value.to_base64())?;
            let _ = write!(w.out, ",\"subType\":\"{:02x}\"}}", u8::from(value.subtype));
            Ok(())
        })
    }

    fn write_object_id(&mut self, value: ObjectId) -> Result<()> {
        self.wrapped_str(Kind::ObjectId, "$oid", &value.to_hex())
    }

    fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.begin(Kind::Boolean)?;
        self.out.push_str(if value { "true" } else { "false" });
        Ok(())
    }

    fn write_date_time(&mut self, value: DateTime) -> Result<()> {
        let millis = value.timestamp_millis();
        if self.relaxed() && (0..=MAX_ISO_DATE).contains(&millis) {
            if let Some(text) = value.try_to_rfc3339() {
                return self.wrapped_str(Kind::DateTime, "$date", &text);
            }
        }
        self.wrapped(Kind::DateTime, "$date", |w| {
            let _ = write!(w.out, "{{\"$numberLong\":\"{millis}\"}}");
            Ok(())
        })
    }

    fn write_null(&mut self) -> Result<()> {
        self.begin(Kind::Null)?;
        self.out.push_str("null");
        Ok(())
    }

    fn write_regular_expression(&mut self, value: &Regex) -> Result<()> {
        self.wrapped(Kind::RegularExpression, "$regularExpression", |w| {
            w.out.push_str("{\"pattern\":");
            w.push_quoted(&value.pattern)?;
            w.out.push_str(",\"options\":");
            w.push_quoted(&value.options)?;
            w.out.push('}');
            Ok(())
        })
    }

    fn write_javascript(&mut self, code: &str) -> Result<()> {
        self.wrapped_str(Kind::JavaScript, "$code", code)
    }

    fn write_javascript_with_scope(&mut self, code: &str) -> Result<()> {
        self.begin(Kind::JavaScriptWithScope)?;
        self.context.open_scope();
        self.out.push_str("{\"$code\":");
        self.push_quoted(code)
    }

    fn write_int32(&mut self, value: i32) -> Result<()> {
        if self.relaxed() {
            self.begin(Kind::Int32)?;
            let _ = write!(self.out, "{value}");
            return Ok(());
        }
        self.wrapped_str(Kind::Int32, "$numberInt", &value.to_string())
    }

    fn write_timestamp(&mut self, value: Timestamp) -> Result<()> {
        self.wrapped(Kind::Timestamp, "$timestamp", |w| {
            let _ = write!(w.out, "{{\"t\":{},\"i\":{}}}", value.time, value.increment);
            Ok(())
        })
    }

    fn write_int64(&mut self, value: i64) -> Result<()> {
        if self.relaxed() {
            self.begin(Kind::Int64)?;
            let _ = write!(self.out, "{value}");
            return Ok(());
        }
        self.wrapped_str(Kind::Int64, "$numberLong", &value.to_string())
    }

    fn write_decimal128(&mut self, value: Decimal128) -> Result<()> {
        self.wrapped_str(Kind::Decimal128, "$numberDecimal", &value.to_string())
    }

    fn write_min_key(&mut self) -> Result<()> {
        self.wrapped(Kind::MinKey, "$minKey", |w| {
            w.out.push('1');
            Ok(())
        })
    }

    fn write_max_key(&mut self) -> Result<()> {
        self.wrapped(Kind::MaxKey, "$maxKey", |w| {
            w.out.push('1');
            Ok(())
        })
    }
}
