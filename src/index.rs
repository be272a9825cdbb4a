use crate::{Document, Error};

mod private {
    pub trait Sealed {}
    impl Sealed for usize {}
    impl Sealed for str {}
    impl Sealed for String {}
    impl<T> Sealed for &T where T: ?Sized + Sealed {}
}

/// A key into a [`Document`]: either a position or an element name.
///
/// Name lookups resolve to the first element with that name.
///
/// # Example
///
/// ```
/// use na_bson::Document;
///
/// let doc: Document = [("a", 1), ("b", 2)].into_iter().collect();
/// assert_eq!(doc.get("b"), doc.get(1));
/// assert!(doc.get(5).is_none());
/// ```
pub trait Index: private::Sealed {
    /// Resolves this key to an element position, if one matches.
    #[doc(hidden)]
    fn position_in(&self, document: &Document) -> Option<usize>;

    /// The error reported when this key does not resolve.
    #[doc(hidden)]
    fn missing(&self, document: &Document) -> Error;
}

impl Index for usize {
    #[inline]
    fn position_in(&self, document: &Document) -> Option<usize> {
        (*self < document.len()).then_some(*self)
    }

    fn missing(&self, document: &Document) -> Error {
        Error::OutOfRange {
            index: *self,
            len: document.len(),
        }
    }
}

impl Index for str {
    #[inline]
    fn position_in(&self, document: &Document) -> Option<usize> {
        document.index_of_name(self)
    }

    fn missing(&self, _: &Document) -> Error {
        Error::KeyNotFound(self.to_owned())
    }
}

impl Index for String {
    #[inline]
    fn position_in(&self, document: &Document) -> Option<usize> {
        document.index_of_name(self)
    }

    fn missing(&self, _: &Document) -> Error {
        Error::KeyNotFound(self.clone())
    }
}

impl<T: ?Sized + Index> Index for &T {
    #[inline]
    fn position_in(&self, document: &Document) -> Option<usize> {
        (**self).position_in(document)
    }

    fn missing(&self, document: &Document) -> Error {
        (**self).missing(document)
    }
}
