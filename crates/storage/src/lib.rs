//! Storage layer for spandb
//!
//! This crate implements the indexed bucket store:
//! - [`DataLog`]: append-only payload log, one per bucket
//! - [`IdIndex`]: persistent id -> (location, chain slot) map
//! - [`TagChains`]: in-memory tag -> chain-tail map, rebuilt on open
//! - [`Bucket`]: typed composition of the three plus a codec
//! - [`BucketManager`]: process-wide registry of open buckets
//!
//! Payloads are immutable once appended; all mutability lives in the
//! chain slots of the id index, which are patched in place and published
//! atomically so readers never observe a half-written pointer.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bucket;
pub mod chains;
pub mod config;
pub mod data_log;
mod fs;
pub mod index;
pub mod manager;

pub use bucket::Bucket;
pub use chains::TagChains;
pub use config::{BucketConfig, DEFAULT_PARTITIONS};
pub use data_log::DataLog;
pub use index::{IdIndex, Slot, NIL_SLOT};
pub use manager::BucketManager;
