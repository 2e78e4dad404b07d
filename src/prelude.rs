//! Convenient imports for spandb.
//!
//! ```ignore
//! use spandb::prelude::*;
//!
//! let manager = BucketManager::with_base_dir("./buckets");
//! let bucket = manager.bytes_bucket("raw")?;
//! ```

// Entry points
pub use crate::{Bucket, BucketConfig, BucketManager};

// Error handling
pub use crate::{Result, StoreError};

// Payload types and the codec boundary
pub use crate::{Codec, SpanRecord};
