use std::fmt;

use crate::{Error, RawArray, Result, Value, cold_path};

enum Backing {
    Owned(Vec<Value>),
    Raw(RawArray),
}

/// An ordered sequence of values.
///
/// An array is either an owned, growable list or a read-only view over
/// encoded bytes. Mutating methods fail with [`Error::NotSupported`] on the
/// latter.
///
/// # Example
///
/// ```
/// use na_bson::{Array, Value};
///
/// let mut array = Array::new();
/// array.push(1).unwrap().push("two").unwrap();
///
/// assert_eq!(array.index_of(&Value::from("two")), Some(1));
/// assert_eq!(array.index_of(&Value::from(1.0)), Some(0));
/// ```
pub struct Array {
    backing: Backing,
}

const READ_ONLY: Error = Error::NotSupported("raw arrays are read-only");

impl Array {
    pub fn new() -> Self {
        Self::from_values(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_values(Vec::with_capacity(capacity))
    }

    #[inline]
    fn from_values(values: Vec<Value>) -> Self {
        Self {
            backing: Backing::Owned(values),
        }
    }

    /// A read-only array over validated bytes.
    #[inline]
    pub fn from_raw(raw: RawArray) -> Self {
        Self {
            backing: Backing::Raw(raw),
        }
    }

    pub fn as_raw(&self) -> Option<&RawArray> {
        match &self.backing {
            Backing::Raw(raw) => Some(raw),
            Backing::Owned(_) => None,
        }
    }

    fn values_mut(&mut self) -> Result<&mut Vec<Value>> {
        match &mut self.backing {
            Backing::Owned(values) => Ok(values),
            Backing::Raw(_) => {
                cold_path();
                Err(READ_ONLY)
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        match &self.backing {
            Backing::Owned(values) => values.len(),
            Backing::Raw(raw) => raw.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        matches!(self.backing, Backing::Raw(_))
    }

    /// Storage reserved for values. A raw array reports its length.
    pub fn capacity(&self) -> usize {
        match &self.backing {
            Backing::Owned(values) => values.capacity(),
            Backing::Raw(raw) => raw.len(),
        }
    }

    /// Grows or shrinks reserved storage. Fails with [`Error::OutOfRange`]
    /// when `capacity` is below the current length.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        let values = self.values_mut()?;
        if capacity < values.len() {
            cold_path();
            return Err(Error::OutOfRange {
                index: capacity,
                len: values.len(),
            });
        }
        if capacity > values.capacity() {
            values.reserve_exact(capacity - values.len());
        } else {
            values.shrink_to(capacity);
        }
        Ok(())
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Value> {
        match &self.backing {
            Backing::Owned(values) => values.get(index).cloned(),
            Backing::Raw(raw) => raw.get(index),
        }
    }

    /// The value at `index`, or [`Error::OutOfRange`].
    pub fn value(&self, index: usize) -> Result<Value> {
        self.get(index).ok_or_else(|| {
            cold_path();
            Error::OutOfRange {
                index,
                len: self.len(),
            }
        })
    }

    pub fn iter(&self) -> ArrayIter<'_> {
        match &self.backing {
            Backing::Owned(values) => ArrayIter::Owned(values.iter()),
            Backing::Raw(raw) => ArrayIter::Raw { array: raw, next: 0 },
        }
    }

    pub fn to_values(&self) -> Vec<Value> {
        self.iter().collect()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.index_of(value).is_some()
    }

    /// Position of the first value equal to `value`.
    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.iter().position(|v| &v == value)
    }

    /// Like [`Array::index_of`], searching from `start` to the end.
    ///
    /// `start` may equal `len`, which finds nothing.
    pub fn index_of_from(&self, value: &Value, start: usize) -> Result<Option<usize>> {
        let len = self.len();
        if start > len {
            cold_path();
            return Err(Error::OutOfRange { index: start, len });
        }
        self.index_of_range(value, start, len - start)
    }

    /// Like [`Array::index_of`], searching only `count` values from `start`.
    ///
    /// The returned position is absolute. Fails with [`Error::OutOfRange`]
    /// unless `start <= len` and `start + count <= len`.
    pub fn index_of_range(&self, value: &Value, start: usize, count: usize) -> Result<Option<usize>> {
        let len = self.len();
        let end = start.checked_add(count).filter(|&end| start <= len && end <= len);
        let Some(end) = end else {
            cold_path();
            return Err(Error::OutOfRange { index: start, len });
        };
        Ok((start..end).find(|&i| self.get(i).is_some_and(|v| &v == value)))
    }

    pub fn push(&mut self, value: impl Into<Value>) -> Result<&mut Self> {
        self.values_mut()?.push(value.into());
        Ok(self)
    }

    pub fn add_range<V: Into<Value>>(&mut self, values: impl IntoIterator<Item = V>) -> Result<&mut Self> {
        let target = self.values_mut()?;
        target.extend(values.into_iter().map(Into::into));
        Ok(self)
    }

    /// Inserts at `index`, shifting later values. `index` may equal `len`.
    pub fn insert(&mut self, index: usize, value: impl Into<Value>) -> Result<&mut Self> {
        let values = self.values_mut()?;
        if index > values.len() {
            cold_path();
            return Err(Error::OutOfRange {
                index,
                len: values.len(),
            });
        }
        values.insert(index, value.into());
        Ok(self)
    }

    /// Replaces the value at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) -> Result<Value> {
        let values = self.values_mut()?;
        match values.get_mut(index) {
            Some(slot) => Ok(std::mem::replace(slot, value.into())),
            None => {
                cold_path();
                Err(Error::OutOfRange {
                    index,
                    len: values.len(),
                })
            }
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Result<Option<&mut Value>> {
        Ok(self.values_mut()?.get_mut(index))
    }

    /// Removes the first value equal to `value`.
    pub fn remove(&mut self, value: &Value) -> Result<bool> {
        let values = self.values_mut()?;
        match values.iter().position(|v| v == value) {
            Some(i) => {
                values.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Value> {
        let values = self.values_mut()?;
        if index >= values.len() {
            cold_path();
            return Err(Error::OutOfRange {
                index,
                len: values.len(),
            });
        }
        Ok(values.remove(index))
    }

    pub fn clear(&mut self) -> Result<()> {
        self.values_mut()?.clear();
        Ok(())
    }

    /// Recursively copies every nested document and array into owned,
    /// mutable containers.
    pub fn deep_clone(&self) -> Array {
        match &self.backing {
            Backing::Owned(values) => values.iter().map(Value::deep_clone).collect(),
            Backing::Raw(raw) => raw.to_array(),
        }
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Array {
    /// Copies the value list; values stay shared. A raw array is decoded at
    /// every level into an owned, mutable copy that does not hold the buffer.
    fn clone(&self) -> Self {
        match &self.backing {
            Backing::Owned(values) => Self::from_values(values.clone()),
            Backing::Raw(raw) => raw.to_array(),
        }
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = crate::JsonWriter::render_array(self, crate::JsonWriterSettings::default())
            .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        Self::from_values(iter.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<Vec<V>> for Array {
    fn from(values: Vec<V>) -> Self {
        values.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = Value;
    type IntoIter = ArrayIter<'a>;

    fn into_iter(self) -> ArrayIter<'a> {
        self.iter()
    }
}

/// Iterator over the values of an [`Array`], in order.
pub enum ArrayIter<'a> {
    #[doc(hidden)]
    Owned(std::slice::Iter<'a, Value>),
    #[doc(hidden)]
    Raw { array: &'a RawArray, next: usize },
}

impl Iterator for ArrayIter<'_> {
    type Item = Value;

    #[inline]
    fn next(&mut self) -> Option<Value> {
        match self {
            ArrayIter::Owned(iter) => iter.next().cloned(),
            ArrayIter::Raw { array, next } => {
                let value = array.get(*next)?;
                *next += 1;
                Some(value)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self {
            ArrayIter::Owned(iter) => iter.len(),
            ArrayIter::Raw { array, next } => array.len().saturating_sub(*next),
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ArrayIter<'_> {}
