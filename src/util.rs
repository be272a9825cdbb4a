#[inline(always)]
#[cold]
pub(crate) fn cold_path() {}

/// BSON is little-endian throughout.
pub(crate) type LE = zerocopy::LittleEndian;

/// Smallest valid encoded document: a 4-byte length followed by the terminator.
pub(crate) const EMPTY_DOCUMENT: [u8; 5] = [5, 0, 0, 0, 0];
