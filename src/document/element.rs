use crate::Value;

/// A named value inside a [`Document`](crate::Document).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Element {
    name: String,
    value: Value,
}

impl Element {
    #[inline]
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn into_parts(self) -> (String, Value) {
        (self.name, self.value)
    }

    pub fn deep_clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            value: self.value.deep_clone(),
        }
    }

    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    #[inline]
    pub(crate) fn replace_value(&mut self, value: Value) -> Value {
        std::mem::replace(&mut self.value, value)
    }
}

impl<K: Into<String>, V: Into<Value>> From<(K, V)> for Element {
    fn from((name, value): (K, V)) -> Self {
        Self::new(name, value)
    }
}
