//! Bucket store configuration.

use std::path::PathBuf;

/// Default number of round-robin partitions for untagged stores.
pub const DEFAULT_PARTITIONS: u64 = 10;

/// Configuration surface of the bucket manager.
///
/// `base_dir` is the directory under which every bucket keeps its pair
/// of files, namespaced by payload kind:
/// `<base_dir>/<kind>/<name>.dat` and `<base_dir>/<kind>/<name>.idx`.
///
/// `partitions` governs default tag assignment for untagged stores: the
/// bucket round-robins over `tag0..tag{partitions-1}`, sharding
/// otherwise-untagged data for write locality without semantic meaning.
#[derive(Debug, Clone)]
pub struct BucketConfig {
    /// Directory holding all bucket files
    pub base_dir: PathBuf,
    /// Round-robin partition count for untagged stores
    pub partitions: u64,
}

impl BucketConfig {
    /// Configuration with the default partition count.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        BucketConfig {
            base_dir: base_dir.into(),
            partitions: DEFAULT_PARTITIONS,
        }
    }

    /// Override the partition count (clamped to at least 1).
    pub fn with_partitions(mut self, partitions: u64) -> Self {
        self.partitions = partitions.max(1);
        self
    }
}
