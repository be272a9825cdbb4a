//! Error types for BSON value, container, and codec operations.
//!
//! This module contains the [`Error`] type which represents every failure a
//! call into this crate can report: malformed input bytes, contract
//! violations on containers, and failed conversions.
//!
//! # Example
//!
//! ```
//! use na_bson::{Array, Error, Result};
//!
//! fn third(array: &Array) -> Result<i32> {
//!     match array.value(2) {
//!         Ok(value) => value.to_int32(),
//!         Err(Error::OutOfRange { index, len }) => {
//!             println!("index {index} is past the end ({len} values)");
//!             Err(Error::OutOfRange { index, len })
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::fmt::{self, Display};

use crate::Kind;

/// Alias for a `Result` with the error type [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// This type represents all possible errors that can occur when building,
/// reading, converting, or encoding BSON values.
///
/// Errors are always scoped to the offending call: a failed mutation leaves
/// the container exactly as it was before the call.
#[derive(Debug)]
pub enum Error {
    /// A free-form message, produced by serde implementations.
    Message(String),

    /// An I/O error occurred while writing encoded bytes.
    IO(std::io::Error),

    /// The input ended unexpectedly.
    ///
    /// A length prefix or a NUL-terminated name points past the end of the
    /// buffer.
    EndOfFile,

    /// Extra bytes remain after the outermost document.
    TrailingData(usize),

    /// A type byte outside the set of supported BSON kinds was found.
    InvalidKind(u8),

    /// A length prefix is negative, too small, or disagrees with the
    /// enclosing document.
    InvalidLength(i64),

    /// A string or element name is not valid UTF-8.
    InvalidUtf8,

    /// The encoded structure is inconsistent in a way not covered above.
    Malformed(&'static str),

    /// Map key must be a string type.
    ///
    /// Document element names are strings. This error is returned when a
    /// serializer produces a map with non-string keys.
    KeyMustBeString,

    /// An index or a start/count window lies outside the container.
    OutOfRange { index: usize, len: usize },

    /// No element with the requested name exists.
    KeyNotFound(String),

    /// The value's kind cannot be converted to the requested host type.
    InvalidCast { from: Kind, to: &'static str },

    /// A string could not be parsed as the requested host type.
    Format(String),

    /// A numeric conversion does not fit the requested host type.
    Overflow { to: &'static str },

    /// The operation is not available on this container variant.
    NotSupported(&'static str),

    /// A writer was driven out of order (e.g. a value without a name).
    InvalidState(&'static str),

    /// A document was required at the top level, but another kind was produced.
    TopLevelNotDocument(Kind),
}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T: Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

impl Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Message(message) => formatter.write_str(message),
            Error::IO(error) => formatter.write_str(&error.to_string()),
            Error::EndOfFile => formatter.write_str("unexpected end of input"),
            Error::TrailingData(remaining_bytes) => write!(
                formatter,
                "trailing data after end of input: {remaining_bytes} bytes remaining"
            ),
            Error::InvalidKind(kind) => write!(formatter, "invalid BSON type byte: {kind:#04x}"),
            Error::InvalidLength(len) => write!(formatter, "invalid length prefix: {len}"),
            Error::InvalidUtf8 => formatter.write_str("invalid UTF-8 in string or name"),
            Error::Malformed(what) => write!(formatter, "malformed BSON: {what}"),
            Error::KeyMustBeString => formatter.write_str("map key must be a string"),
            Error::OutOfRange { index, len } => {
                write!(formatter, "index {index} out of range for length {len}")
            }
            Error::KeyNotFound(name) => write!(formatter, "element '{name}' not found"),
            Error::InvalidCast { from, to } => {
                write!(formatter, "cannot convert {from:?} to {to}")
            }
            Error::Format(message) => write!(formatter, "format error: {message}"),
            Error::Overflow { to } => write!(formatter, "value is out of range for {to}"),
            Error::NotSupported(what) => write!(formatter, "not supported: {what}"),
            Error::InvalidState(what) => write!(formatter, "invalid writer state: {what}"),
            Error::TopLevelNotDocument(kind) => {
                write!(formatter, "top-level value must be a document, got {kind:?}")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IO(error) => Some(error),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}
