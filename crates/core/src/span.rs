//! Structured trace-message payload.
//!
//! A [`SpanRecord`] carries the identity fields a collector needs to
//! stitch individual messages back into a call tree: its own message id,
//! the parent and root ids of the trace, and where/when it was produced.
//! The record is the typical structured payload stored in a bucket, with
//! the trace id doubling as the chain tag so "next span in this trace"
//! is a single chain hop.

use crate::codec::Codec;
use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};

/// One trace message as delivered by the collector transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanRecord {
    /// Application domain that produced the span
    pub domain: String,
    /// Host name of the producing machine
    pub hostname: String,
    /// IP address of the producing machine
    pub ip_address: String,
    /// Unique message id, also used as the bucket entry id
    pub message_id: String,
    /// Id of the parent message in the call tree, empty at the root
    pub parent_message_id: String,
    /// Id of the root message of the whole trace
    pub root_message_id: String,
    /// Session the message belongs to
    pub session_token: String,
    /// Producing thread id
    pub thread_id: String,
    /// Producing thread name
    pub thread_name: String,
    /// Production time, milliseconds since the epoch
    pub timestamp_ms: u64,
}

impl SpanRecord {
    /// Create a record with the given message id and empty identity fields.
    pub fn with_message_id(message_id: impl Into<String>) -> Self {
        SpanRecord {
            message_id: message_id.into(),
            ..Default::default()
        }
    }
}

impl Codec for SpanRecord {
    const KIND: &'static str = "span";

    fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}
