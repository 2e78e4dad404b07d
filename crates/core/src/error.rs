//! Error taxonomy for the bucket store.
//!
//! Errors fall into three families:
//! - caller-recoverable per operation: [`StoreError::DuplicateId`],
//!   [`StoreError::Io`] — a single store fails, the bucket stays healthy
//! - contract violations: [`StoreError::TagMismatch`],
//!   [`StoreError::NotOpen`], [`StoreError::AlreadyOpen`]
//! - fatal to the bucket instance: [`StoreError::Corruption`] — the index
//!   and data log disagree, or stored bytes no longer decode; continuing
//!   would risk returning wrong data, so the operator must rebuild or
//!   discard the bucket

use thiserror::Error;

/// All bucket store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Id already present in the bucket; the original value is untouched.
    #[error("duplicate id: {0}")]
    DuplicateId(String),

    /// Underlying storage read/write failed (disk full, permissions,
    /// closed handle).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Index and data log disagree, or stored bytes failed validation.
    /// Fatal to the bucket instance; no partial recovery is attempted.
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// Payload encode/decode failed at the codec boundary.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A chain query supplied a tag the entry was not stored under.
    #[error("tag mismatch for id {id}: stored under {stored:?}, queried with {requested:?}")]
    TagMismatch {
        /// Id whose chain slot was resolved
        id: String,
        /// Tag the entry was actually stored under
        stored: String,
        /// Tag supplied by the caller
        requested: String,
    },

    /// Operation on a bucket that is not open.
    #[error("bucket {0:?} is not open")]
    NotOpen(String),

    /// `initialize` on a bucket that is already open.
    #[error("bucket {0:?} is already open")]
    AlreadyOpen(String),

    /// Invariant violation that indicates a bug rather than bad input.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for bucket store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// True for conditions a caller may recover from by retrying the
    /// single failed operation (with a different id, after freeing disk
    /// space, and so on).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::DuplicateId(_) | StoreError::Io(_))
    }

    /// True for the duplicate-id rejection.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::DuplicateId(_))
    }

    /// True for structural inconsistencies that are fatal to the bucket.
    pub fn is_corruption(&self) -> bool {
        matches!(self, StoreError::Corruption(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(StoreError::DuplicateId("id0".into()).is_recoverable());
        assert!(StoreError::DuplicateId("id0".into()).is_duplicate());
        assert!(!StoreError::DuplicateId("id0".into()).is_corruption());

        let io = StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        ));
        assert!(io.is_recoverable());

        let corrupt = StoreError::Corruption("offset out of bounds".into());
        assert!(corrupt.is_corruption());
        assert!(!corrupt.is_recoverable());
    }

    #[test]
    fn display_includes_context() {
        let err = StoreError::TagMismatch {
            id: "id7".into(),
            stored: "tag7".into(),
            requested: "tag3".into(),
        };
        let text = err.to_string();
        assert!(text.contains("id7"));
        assert!(text.contains("tag7"));
        assert!(text.contains("tag3"));
    }
}
