//! Payload serialization boundary.
//!
//! The storage engine is type-agnostic: it always stores bytes. A value
//! type plugs in by implementing [`Codec`], and a typed bucket is the
//! engine bound to one codec. Encode and decode must be total for valid
//! input; a decode failure on bytes that were read back successfully is
//! escalated to corruption by the bucket, not treated as caller error.

use crate::error::{Result, StoreError};

/// Serialization capability for bucket payloads.
///
/// `KIND` names the payload family and namespaces on-disk files, so the
/// same bucket name used with different value types never collides on
/// storage paths.
pub trait Codec: Sized {
    /// Short, path-safe name for this payload family.
    const KIND: &'static str;

    /// Serialize the value to bytes.
    fn encode(&self) -> Result<Vec<u8>>;

    /// Deserialize a value from bytes previously produced by [`encode`].
    ///
    /// [`encode`]: Codec::encode
    fn decode(bytes: &[u8]) -> Result<Self>;
}

impl Codec for Vec<u8> {
    const KIND: &'static str = "bytes";

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.clone())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl Codec for String {
    const KIND: &'static str = "string";

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(self.as_bytes().to_vec())
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| StoreError::Serialization(format!("invalid UTF-8 payload: {}", e)))
    }
}
