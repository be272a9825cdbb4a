use crate::{
    Array, Binary, BsonValue, BsonWriter, DateTime, Decimal128, Document, Element, Error, Kind,
    ObjectId, Regex, Result, Timestamp, Value, cold_path,
    document::ElementList,
    writer::{Position, WriterContext},
};

enum Partial {
    Document {
        at: Position,
        elements: ElementList,
    },
    Array {
        at: Position,
        values: Vec<Value>,
    },
    Scope {
        at: Position,
        code: String,
    },
}

/// Builds an owned [`Document`] from writer calls.
///
/// This is how wrapped documents are materialized: the serializer writes
/// into a builder and the finished document supplies the elements.
///
/// # Example
///
/// ```
/// use na_bson::{BsonWriter, Value, ValueBuilder};
///
/// let mut builder = ValueBuilder::new();
/// builder.write_start_document().unwrap();
/// builder.write_name("tags").unwrap();
/// builder.write_start_array().unwrap();
/// builder.write_string("a").unwrap();
/// builder.write_end_array().unwrap();
/// builder.write_end_document().unwrap();
///
/// let doc = builder.into_document().unwrap();
/// assert_eq!(doc.get("tags"), Some(Value::from(vec!["a"])));
/// ```
pub struct ValueBuilder {
    context: WriterContext,
    stack: Vec<Partial>,
    root: Option<Value>,
}

impl Default for ValueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueBuilder {
    /// A builder for one top-level document.
    pub fn new() -> Self {
        Self::with_context(WriterContext::new())
    }

    /// A builder for one top-level value of any kind.
    pub fn for_value() -> Self {
        Self::with_context(WriterContext::any_root())
    }

    fn with_context(context: WriterContext) -> Self {
        Self {
            context,
            stack: Vec::new(),
            root: None,
        }
    }

    pub fn into_value(self) -> Result<Value> {
        match self.root {
            Some(value) if self.context.is_finished() => Ok(value),
            _ => {
                cold_path();
                Err(Error::InvalidState("no complete value was written"))
            }
        }
    }

    pub fn into_document(self) -> Result<Document> {
        let value = self.into_value()?;
        match value.into_inner() {
            BsonValue::Document(document) => Ok(document),
            other => {
                cold_path();
                Err(Error::TopLevelNotDocument(other.kind()))
            }
        }
    }

    fn attach(&mut self, at: Position, value: Value) -> Result<()> {
        match at {
            Position::Root => {
                self.root = Some(value);
                Ok(())
            }
            Position::Element(name) => match self.stack.last_mut() {
                Some(Partial::Document { elements, .. }) => {
                    elements.push(Element::new(name, value));
                    Ok(())
                }
                Some(Partial::Array { values, .. }) => {
                    values.push(value);
                    Ok(())
                }
                _ => {
                    cold_path();
                    Err(Error::InvalidState("no open container for value"))
                }
            },
            Position::Scope => {
                cold_path();
                Err(Error::InvalidState("scope attached as a value"))
            }
        }
    }

    fn scalar(&mut self, payload: BsonValue) -> Result<()> {
        let at = self.context.next_value(payload.kind())?;
        self.attach(at, Value::new(payload))
    }
}

impl BsonWriter for ValueBuilder {
    fn write_start_document(&mut self) -> Result<()> {
        let at = self.context.next_value(Kind::Document)?;
        self.context.open_document(&at);
        self.stack.push(Partial::Document {
            at,
            elements: ElementList::default(),
        });
        Ok(())
    }

    fn write_end_document(&mut self) -> Result<()> {
        let closed = self.context.close_document()?;
        let Some(Partial::Document { at, elements }) = self.stack.pop() else {
            cold_path();
            return Err(Error::InvalidState("no open document to end"));
        };
        let document = Document::from_list(elements);
        if !closed.scope {
            return self.attach(at, Value::new(BsonValue::Document(document)));
        }
        let Some(Partial::Scope { at, code }) = self.stack.pop() else {
            cold_path();
            return Err(Error::InvalidState("scope without code"));
        };
        self.attach(
            at,
            Value::new(BsonValue::JavaScriptWithScope {
                code,
                scope: document,
            }),
        )
    }

    fn write_start_array(&mut self) -> Result<()> {
        let at = self.context.next_value(Kind::Array)?;
        self.context.open_array();
        self.stack.push(Partial::Array {
            at,
            values: Vec::new(),
        });
        Ok(())
    }

    fn write_end_array(&mut self) -> Result<()> {
        self.context.close_array()?;
        let Some(Partial::Array { at, values }) = self.stack.pop() else {
            cold_path();
            return Err(Error::InvalidState("no open array to end"));
        };
        self.attach(at, Value::new(BsonValue::Array(Array::from(values))))
    }

    fn write_name(&mut self, name: &str) -> Result<()> {
        self.context.write_name(name)
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        self.scalar(BsonValue::Double(value))
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.scalar(BsonValue::String(value.to_owned()))
    }

    fn write_symbol(&mut self, value: &str) -> Result<()> {
        self.scalar(BsonValue::Symbol(value.to_owned()))
    }

    fn write_binary(&mut self, value: &Binary) -> Result<()> {
        self.scalar(BsonValue::Binary(value.clone()))
    }

    fn write_object_id(&mut self, value: ObjectId) -> Result<()> {
        self.scalar(BsonValue::ObjectId(value))
    }

    fn write_boolean(&mut self, value: bool) -> Result<()> {
        self.scalar(BsonValue::Boolean(value))
    }

    fn write_date_time(&mut self, value: DateTime) -> Result<()> {
        self.scalar(BsonValue::DateTime(value))
    }

    fn write_null(&mut self) -> Result<()> {
        self.scalar(BsonValue::Null)
    }

    fn write_regular_expression(&mut self, value: &Regex) -> Result<()> {
        self.scalar(BsonValue::RegularExpression(value.clone()))
    }

    fn write_javascript(&mut self, code: &str) -> Result<()> {
        self.scalar(BsonValue::JavaScript(code.to_owned()))
    }

    fn write_javascript_with_scope(&mut self, code: &str) -> Result<()> {
        let at = self.context.next_value(Kind::JavaScriptWithScope)?;
        self.context.open_scope();
        self.stack.push(Partial::Scope {
            at,
            code: code.to_owned(),
        });
        Ok(())
    }

    fn write_int32(&mut self, value: i32) -> Result<()> {
        self.scalar(BsonValue::Int32(value))
    }

    fn write_timestamp(&mut self, value: Timestamp) -> Result<()> {
        self.scalar(BsonValue::Timestamp(value))
    }

    fn write_int64(&mut self, value: i64) -> Result<()> {
        self.scalar(BsonValue::Int64(value))
    }

    fn write_decimal128(&mut self, value: Decimal128) -> Result<()> {
        self.scalar(BsonValue::Decimal128(value))
    }

    fn write_min_key(&mut self) -> Result<()> {
        self.scalar(BsonValue::MinKey)
    }

    fn write_max_key(&mut self) -> Result<()> {
        self.scalar(BsonValue::MaxKey)
    }
}
