//! A BSON value model: typed values with a total cross-kind order, mutable
//! documents and arrays, documents backed lazily by a serializer, and
//! zero-copy views over encoded bytes.
//!
//! # Example
//!
//! ```
//! use na_bson::{Document, RawDocument, Value, doc};
//!
//! let mut doc = doc! { "a" => 1, "b" => 2.0 };
//! doc.set("c", "three").unwrap();
//!
//! // numbers of different kinds compare by value
//! assert_eq!(doc.get("a"), Some(Value::from(1.0)));
//! assert!(doc.get("b").unwrap() > Value::from(1i64));
//!
//! // encode, then read back without copying
//! let bytes = doc.to_vec().unwrap();
//! let raw = Document::from_raw(RawDocument::from_vec(bytes).unwrap());
//! assert!(raw.is_read_only());
//! assert_eq!(raw, doc);
//! ```

mod array;
mod cache;
mod compare;
mod convert;
mod document;
mod error;
pub mod extjson;
mod index;
mod kind;
mod raw;
mod reader;
#[cfg(feature = "serde")]
pub mod ser;
mod types;
mod util;
mod value;
mod wrapper;
mod writer;

pub use array::*;
pub use cache::INTERNED_RANGE;
pub use convert::*;
pub use document::*;
pub use error::*;
pub use index::*;
pub use kind::*;
pub use raw::*;
pub use reader::*;
pub use types::*;
pub use value::*;
pub use wrapper::*;
pub use writer::*;

use util::cold_path;
