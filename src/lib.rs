//! # spandb
//!
//! Indexed bucket store: the persistence layer of a distributed tracing
//! collector. It durably stores high-volume, append-mostly payloads
//! (raw bytes, strings, or structured trace messages) under short ids,
//! and walks the chain of entries that share a grouping tag in the
//! order they were written.
//!
//! ## Quick Start
//!
//! ```ignore
//! use spandb::prelude::*;
//!
//! let manager = BucketManager::with_base_dir("./buckets");
//! let bucket = manager.string_bucket("data")?;
//!
//! bucket.store_by_id_with_tag("id0", &"value0".to_string(), "trace-1");
//! bucket.store_by_id_with_tag("id1", &"value1".to_string(), "trace-1");
//!
//! assert_eq!(bucket.find_by_id("id0")?, Some("value0".to_string()));
//! assert_eq!(bucket.find_next_by_id("id0", "trace-1")?, Some("value1".to_string()));
//!
//! manager.close_all()?;
//! ```
//!
//! ## Layout
//!
//! Each bucket owns an append-only data log (`<name>.dat`) and a
//! persistent id index with chain slots (`<name>.idx`), namespaced per
//! payload kind under the manager's base directory. Payloads are
//! immutable once written; only chain-pointer metadata mutates.

#![warn(missing_docs)]

pub mod prelude;

// Core types and the codec boundary
pub use spandb_core::{Codec, Location, Result, SpanRecord, StoreError};

// The bucket store
pub use spandb_storage::{
    Bucket, BucketConfig, BucketManager, DataLog, IdIndex, Slot, TagChains, DEFAULT_PARTITIONS,
    NIL_SLOT,
};
