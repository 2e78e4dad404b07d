//! Fundamental types shared across the store.

use serde::{Deserialize, Serialize};

/// Stable reference to one payload in a bucket's data log.
///
/// A location is handed out by the data log on append and never changes
/// afterwards: payloads are immutable and the log is growth-only. The
/// offset addresses the start of the record (its framing header), the
/// length is the payload length excluding framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Byte offset of the record in the data log
    pub offset: u64,
    /// Payload length in bytes, excluding the record header
    pub len: u32,
}

impl Location {
    /// Create a location from raw offset and payload length.
    pub fn new(offset: u64, len: u32) -> Self {
        Location { offset, len }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.offset, self.len)
    }
}
