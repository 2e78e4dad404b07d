//! Bucket store integration tests
//!
//! End-to-end scenarios against the public API: byte, string, and span
//! payloads, chain navigation, close/reinitialize durability, and
//! readers racing a writer.

mod bytes;
mod concurrent;
mod spans;
mod strings;
