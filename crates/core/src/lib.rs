//! Core types for the spandb bucket store
//!
//! This crate defines the pieces shared by every layer of the store:
//! - [`Location`]: stable reference into a bucket's data log
//! - [`StoreError`]: the error taxonomy for all store operations
//! - [`Codec`]: the payload serialization boundary
//! - [`SpanRecord`]: the structured trace-message payload

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod error;
pub mod span;
pub mod types;

pub use codec::Codec;
pub use error::{Result, StoreError};
pub use span::SpanRecord;
pub use types::Location;
