//! Process-wide bucket registry.
//!
//! The manager guarantees at most one live [`Bucket`] instance per
//! (value type, name) within the process, so two instances never write
//! the same pair of files. Buckets are created lazily on first request
//! and handed out as shared `Arc`s afterwards.

use crate::bucket::Bucket;
use crate::config::BucketConfig;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use spandb_core::{Codec, Result, SpanRecord, StoreError};
use std::any::{Any, TypeId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Type-erased view of a registered bucket, enough for registry
/// bookkeeping without knowing the payload type.
trait ManagedBucket: Send + Sync {
    fn close_managed(&self) -> Result<()>;
    fn is_open_managed(&self) -> bool;
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Codec + 'static> ManagedBucket for Bucket<T> {
    fn close_managed(&self) -> Result<()> {
        match self.close() {
            // Already closed directly by the caller; nothing left to do.
            Err(StoreError::NotOpen(_)) => Ok(()),
            other => other,
        }
    }

    fn is_open_managed(&self) -> bool {
        self.is_open()
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

type RegistryKey = (TypeId, String);

/// Registry of open buckets keyed by (value type, name).
pub struct BucketManager {
    config: BucketConfig,
    buckets: DashMap<RegistryKey, Arc<dyn ManagedBucket>>,
}

impl BucketManager {
    /// Create a manager over the given configuration.
    pub fn new(config: BucketConfig) -> Self {
        BucketManager {
            config,
            buckets: DashMap::new(),
        }
    }

    /// Create a manager with default configuration under `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self::new(BucketConfig::new(base_dir))
    }

    /// The manager's configuration.
    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// Return the live bucket for (`T`, `name`), opening it on first
    /// request.
    ///
    /// The registry entry lock covers construction, so concurrent calls
    /// for the same key never race-construct two instances over the
    /// same files. If the registered instance was closed directly, it
    /// is re-initialized in place rather than replaced.
    pub fn bucket<T: Codec + 'static>(&self, name: &str) -> Result<Arc<Bucket<T>>> {
        let key = (TypeId::of::<T>(), name.to_string());
        match self.buckets.entry(key) {
            Entry::Occupied(entry) => {
                let bucket = Self::downcast::<T>(Arc::clone(entry.get()))?;
                if !bucket.is_open() {
                    bucket.initialize(&self.config.base_dir, name)?;
                }
                Ok(bucket)
            }
            Entry::Vacant(entry) => {
                let bucket = Arc::new(Bucket::<T>::new(self.config.partitions));
                bucket.initialize(&self.config.base_dir, name)?;
                debug!(bucket = name, kind = T::KIND, "bucket registered");
                entry.insert(bucket.clone());
                Ok(bucket)
            }
        }
    }

    /// Bucket for raw byte payloads.
    pub fn bytes_bucket(&self, name: &str) -> Result<Arc<Bucket<Vec<u8>>>> {
        self.bucket(name)
    }

    /// Bucket for string payloads.
    pub fn string_bucket(&self, name: &str) -> Result<Arc<Bucket<String>>> {
        self.bucket(name)
    }

    /// Bucket for structured trace messages.
    pub fn span_bucket(&self, name: &str) -> Result<Arc<Bucket<SpanRecord>>> {
        self.bucket(name)
    }

    /// Close the bucket for (`T`, `name`) and drop it from the
    /// registry. Returns whether a bucket was registered.
    pub fn close_bucket<T: Codec + 'static>(&self, name: &str) -> Result<bool> {
        let key = (TypeId::of::<T>(), name.to_string());
        match self.buckets.remove(&key) {
            Some((_, bucket)) => {
                bucket.close_managed()?;
                debug!(bucket = name, kind = T::KIND, "bucket deregistered");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Close and deregister every bucket.
    pub fn close_all(&self) -> Result<()> {
        let keys: Vec<RegistryKey> = self.buckets.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Some((_, bucket)) = self.buckets.remove(&key) {
                bucket.close_managed()?;
            }
        }
        Ok(())
    }

    /// Number of registered buckets (open or directly closed).
    pub fn registered(&self) -> usize {
        self.buckets.len()
    }

    fn downcast<T: Codec + 'static>(bucket: Arc<dyn ManagedBucket>) -> Result<Arc<Bucket<T>>> {
        bucket
            .as_any()
            .downcast::<Bucket<T>>()
            .map_err(|_| StoreError::Internal("bucket registry type confusion".into()))
    }
}

impl std::fmt::Debug for BucketManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketManager")
            .field("base_dir", &self.config.base_dir)
            .field("registered", &self.registered())
            .finish()
    }
}
