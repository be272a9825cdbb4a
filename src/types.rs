//! Payload types for the scalar kinds that have no direct host equivalent.

mod binary;
mod date_time;
mod decimal128;
mod object_id;
mod regex;
mod timestamp;

pub use binary::*;
pub use date_time::*;
pub use decimal128::*;
pub use object_id::*;
pub use regex::*;
pub use timestamp::*;

pub(crate) use decimal128::Decoded;
