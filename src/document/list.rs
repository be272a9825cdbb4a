use std::collections::HashMap;

use crate::{Element, Value};

/// Ordered elements plus a name index.
///
/// The index maps each distinct name to the position of its first
/// occurrence and is kept in sync by every mutation.
#[derive(Clone, Default)]
pub(crate) struct ElementList {
    elements: Vec<Element>,
    positions: HashMap<String, usize>,
}

impl ElementList {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            elements: Vec::with_capacity(capacity),
            positions: HashMap::with_capacity(capacity),
        }
    }

    pub(crate) fn from_elements(elements: Vec<Element>) -> Self {
        let mut list = Self {
            elements,
            positions: HashMap::new(),
        };
        list.reindex();
        list
    }

    fn reindex(&mut self) {
        self.positions.clear();
        for (i, element) in self.elements.iter().enumerate() {
            self.positions.entry(element.name().to_owned()).or_insert(i);
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[Element] {
        &self.elements
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Element> {
        self.elements.get_mut(index)
    }

    #[inline]
    pub(crate) fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub(crate) fn push(&mut self, element: Element) {
        self.positions
            .entry(element.name().to_owned())
            .or_insert(self.elements.len());
        self.elements.push(element);
    }

    pub(crate) fn extend(&mut self, elements: Vec<Element>) {
        self.elements.reserve(elements.len());
        for element in elements {
            self.push(element);
        }
    }

    /// `index` must be at most `len()`.
    pub(crate) fn insert(&mut self, index: usize, element: Element) {
        self.elements.insert(index, element);
        self.reindex();
    }

    /// `index` must be less than `len()`.
    pub(crate) fn remove(&mut self, index: usize) -> Element {
        let element = self.elements.remove(index);
        self.reindex();
        element
    }

    /// Removes every element named `name`, returning how many were removed.
    pub(crate) fn remove_all(&mut self, name: &str) -> usize {
        let before = self.elements.len();
        self.elements.retain(|element| element.name() != name);
        let removed = before - self.elements.len();
        if removed > 0 {
            self.reindex();
        }
        removed
    }

    /// Replaces the value at `index`, returning the previous one.
    pub(crate) fn replace(&mut self, index: usize, value: Value) -> Value {
        self.elements[index].replace_value(value)
    }

    pub(crate) fn clear(&mut self) {
        self.elements.clear();
        self.positions.clear();
    }

    pub(crate) fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    pub(crate) fn deep_clone(&self) -> Self {
        Self {
            elements: self.elements.iter().map(Element::deep_clone).collect(),
            positions: self.positions.clone(),
        }
    }
}
