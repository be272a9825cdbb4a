/// The discriminant of a BSON value.
///
/// The numeric representation of each variant is the type byte used by the
/// binary encoding.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Kind {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    ObjectId = 0x07,
    Boolean = 0x08,
    DateTime = 0x09,
    Null = 0x0A,
    RegularExpression = 0x0B,
    JavaScript = 0x0D,
    Symbol = 0x0E,
    JavaScriptWithScope = 0x0F,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    Decimal128 = 0x13,
    MaxKey = 0x7F,
    MinKey = 0xFF,
}

impl Kind {
    /// Maps a type byte to its kind, or `None` for bytes this model does not
    /// represent (including the deprecated `undefined` and `DBPointer`).
    pub const fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x01 => Self::Double,
            0x02 => Self::String,
            0x03 => Self::Document,
            0x04 => Self::Array,
            0x05 => Self::Binary,
            0x07 => Self::ObjectId,
            0x08 => Self::Boolean,
            0x09 => Self::DateTime,
            0x0A => Self::Null,
            0x0B => Self::RegularExpression,
            0x0D => Self::JavaScript,
            0x0E => Self::Symbol,
            0x0F => Self::JavaScriptWithScope,
            0x10 => Self::Int32,
            0x11 => Self::Timestamp,
            0x12 => Self::Int64,
            0x13 => Self::Decimal128,
            0x7F => Self::MaxKey,
            0xFF => Self::MinKey,
            _ => return None,
        })
    }

    /// Returns `true` for the kinds that compare by numeric value across kind.
    ///
    /// # Example
    ///
    /// ```
    /// use na_bson::Kind;
    ///
    /// assert!(Kind::Int32.is_numeric());
    /// assert!(Kind::Decimal128.is_numeric());
    /// assert!(!Kind::String.is_numeric());
    /// ```
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Int32 | Self::Int64 | Self::Double | Self::Decimal128
        )
    }

    /// Returns `true` for the kinds whose payload nests other values.
    pub const fn is_composite(self) -> bool {
        matches!(
            self,
            Self::Document | Self::Array | Self::JavaScriptWithScope
        )
    }

    /// Position of this kind in the cross-kind total order.
    ///
    /// All numeric kinds share one rank; within that rank values compare by
    /// numeric value.
    pub const fn sort_order(self) -> u8 {
        match self {
            Self::MinKey => 1,
            Self::Null => 2,
            Self::Int32 | Self::Int64 | Self::Double | Self::Decimal128 => 3,
            Self::Symbol => 4,
            Self::String => 5,
            Self::Document => 6,
            Self::Array => 7,
            Self::Binary => 8,
            Self::ObjectId => 9,
            Self::Boolean => 10,
            Self::DateTime => 11,
            Self::Timestamp => 12,
            Self::RegularExpression => 13,
            Self::JavaScript => 14,
            Self::JavaScriptWithScope => 15,
            Self::MaxKey => 16,
        }
    }
}
