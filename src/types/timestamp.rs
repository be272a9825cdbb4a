/// An internal replication timestamp: seconds plus an ordinal within the second.
///
/// Ordering compares `time` first, then `increment`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Timestamp {
    pub time: u32,
    pub increment: u32,
}

impl Timestamp {
    pub const fn new(time: u32, increment: u32) -> Self {
        Self { time, increment }
    }

    /// The encoded 64-bit form: `time` in the high half.
    pub const fn to_u64(self) -> u64 {
        ((self.time as u64) << 32) | self.increment as u64
    }

    pub const fn from_u64(value: u64) -> Self {
        Self {
            time: (value >> 32) as u32,
            increment: value as u32,
        }
    }
}
