//! Typed bucket: data log + id index + tag chains + codec.
//!
//! A bucket stores values by unique string id and links entries that
//! share a tag into a doubly linked chain in store order, so "next
//! entry under this tag" is a single pointer hop instead of a scan.
//!
//! ## Lifecycle
//!
//! `Unopened -> Open -> Closed`, with `Closed -> Open` permitted via
//! [`Bucket::initialize`]. Reopening on the same path must reproduce
//! identical query results: chain state is derived entirely from the
//! persisted chain slots, never from memory alone.
//!
//! ## Concurrency
//!
//! Reads share the state lock and never take the write mutex, so they
//! do not block one another. Stores serialize on the write mutex; the
//! critical section is the duplicate check, one log append, one index
//! insert and at most one pointer patch. Closing takes the state lock
//! exclusively and therefore waits for in-flight operations.

use crate::chains::TagChains;
use crate::data_log::DataLog;
use crate::index::{IdIndex, NIL_SLOT};
use parking_lot::{Mutex, RwLock};
use spandb_core::{Codec, Result, StoreError};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

enum State {
    Closed { name: Option<String> },
    Open(OpenBucket),
}

struct OpenBucket {
    name: String,
    log: DataLog,
    index: IdIndex,
    chains: TagChains,
}

enum Direction {
    Forward,
    Backward,
}

/// A named, persistent, typed key-value store with chain navigation.
pub struct Bucket<T: Codec> {
    state: RwLock<State>,
    /// Serializes the store algorithm; chain linking must be atomic as
    /// a whole or concurrent stores under one tag would drop links.
    write_lock: Mutex<()>,
    /// Round-robin counter for default tag assignment.
    seq: AtomicU64,
    partitions: u64,
    _payload: PhantomData<fn() -> T>,
}

impl<T: Codec> Bucket<T> {
    /// Create an unopened bucket; call [`Bucket::initialize`] before use.
    pub fn new(partitions: u64) -> Self {
        Bucket {
            state: RwLock::new(State::Closed { name: None }),
            write_lock: Mutex::new(()),
            seq: AtomicU64::new(0),
            partitions: partitions.max(1),
            _payload: PhantomData,
        }
    }

    /// (Re)open the bucket's files under `base_dir` for the logical
    /// `name`, creating them if absent, and rebuild the tag chain index
    /// from the persisted chain slots.
    pub fn initialize(&self, base_dir: &Path, name: &str) -> Result<()> {
        let mut state = self.state.write();
        if let State::Open(open) = &*state {
            return Err(StoreError::AlreadyOpen(open.name.clone()));
        }

        let dir = base_dir.join(T::KIND);
        std::fs::create_dir_all(&dir)?;
        let log = DataLog::open(dir.join(format!("{}.dat", name)))?;
        let index = IdIndex::open(dir.join(format!("{}.idx", name)))?;
        let chains = TagChains::new();
        chains.rebuild(&index);

        info!(
            bucket = name,
            kind = T::KIND,
            entries = index.len(),
            tags = chains.len(),
            "bucket opened"
        );
        *state = State::Open(OpenBucket {
            name: name.to_string(),
            log,
            index,
            chains,
        });
        Ok(())
    }

    /// Store `value` under an auto-assigned round-robin tag.
    ///
    /// Returns `false` on any recoverable failure (duplicate id, I/O);
    /// the bucket stays healthy and the caller may retry.
    pub fn store_by_id(&self, id: &str, value: &T) -> bool {
        let partition = self.seq.fetch_add(1, Ordering::Relaxed) % self.partitions;
        self.store_checked(id, value, &format!("tag{}", partition))
    }

    /// Store `value` under an explicit, caller-chosen tag.
    pub fn store_by_id_with_tag(&self, id: &str, value: &T, tag: &str) -> bool {
        self.store_checked(id, value, tag)
    }

    fn store_checked(&self, id: &str, value: &T, tag: &str) -> bool {
        match self.try_store(id, value, tag) {
            Ok(()) => true,
            Err(e) => {
                warn!(id, tag, error = %e, "store failed");
                false
            }
        }
    }

    /// Store `value` under `tag`, surfacing the failure cause.
    pub fn try_store(&self, id: &str, value: &T, tag: &str) -> Result<()> {
        // Encode outside the critical section.
        let payload = value.encode()?;

        self.with_open(|open| {
            let _writer = self.write_lock.lock();

            // Pre-check keeps orphan payloads out of the log; the index
            // insert below remains the authoritative rejection.
            if open.index.contains(id) {
                return Err(StoreError::DuplicateId(id.to_string()));
            }

            let location = open.log.append(&payload)?;
            let prev = open.chains.tail(tag).unwrap_or(NIL_SLOT);
            let slot = open.index.insert(id, tag, location, prev)?;
            if prev != NIL_SLOT {
                let predecessor = open.index.slot(prev).ok_or_else(|| {
                    StoreError::Corruption(format!(
                        "tail of tag {:?} points at missing slot {}",
                        tag, prev
                    ))
                })?;
                open.index.set_next(&predecessor, slot.no())?;
            }
            open.chains.set_tail(tag, slot.no());
            Ok(())
        })
    }

    /// Look up the value stored under `id`.
    ///
    /// `Ok(None)` when the id is unknown. A decode failure on bytes that
    /// were read back successfully means the log and the codec disagree,
    /// which is corruption, not caller error.
    pub fn find_by_id(&self, id: &str) -> Result<Option<T>> {
        self.with_open(|open| {
            let slot = match open.index.get(id) {
                Some(slot) => slot,
                None => return Ok(None),
            };
            Self::fetch(open, slot.id(), slot.location())
        })
    }

    /// Value of the entry stored after `id` under the same tag, or
    /// `None` at the chain tail.
    ///
    /// The supplied tag must be the one the entry was stored under;
    /// a mismatch is rejected as a contract violation.
    pub fn find_next_by_id(&self, id: &str, tag: &str) -> Result<Option<T>> {
        self.follow(id, tag, Direction::Forward)
    }

    /// Value of the entry stored before `id` under the same tag, or
    /// `None` at the chain head.
    pub fn find_previous_by_id(&self, id: &str, tag: &str) -> Result<Option<T>> {
        self.follow(id, tag, Direction::Backward)
    }

    fn follow(&self, id: &str, tag: &str, direction: Direction) -> Result<Option<T>> {
        self.with_open(|open| {
            let slot = match open.index.get(id) {
                Some(slot) => slot,
                None => return Ok(None),
            };
            if slot.tag() != tag {
                return Err(StoreError::TagMismatch {
                    id: id.to_string(),
                    stored: slot.tag().to_string(),
                    requested: tag.to_string(),
                });
            }

            let neighbor_no = match direction {
                Direction::Forward => slot.next(),
                Direction::Backward => slot.prev(),
            };
            if neighbor_no == NIL_SLOT {
                return Ok(None);
            }
            let neighbor = open.index.slot(neighbor_no).ok_or_else(|| {
                StoreError::Corruption(format!(
                    "chain of tag {:?} links to missing slot {}",
                    tag, neighbor_no
                ))
            })?;
            Self::fetch(open, neighbor.id(), neighbor.location())
        })
    }

    fn fetch(open: &OpenBucket, id: &str, location: spandb_core::Location) -> Result<Option<T>> {
        let payload = open.log.read(location)?;
        let value = T::decode(&payload).map_err(|e| {
            StoreError::Corruption(format!(
                "stored payload for id {:?} failed to decode: {}",
                id, e
            ))
        })?;
        Ok(Some(value))
    }

    /// Flush both files and release their handles.
    ///
    /// Waits for in-flight stores. Afterwards every operation except
    /// [`Bucket::initialize`] fails with [`StoreError::NotOpen`].
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        match std::mem::replace(&mut *state, State::Closed { name: None }) {
            State::Open(open) => {
                let flushed = open.log.sync().and_then(|_| open.index.sync());
                info!(
                    bucket = %open.name,
                    kind = T::KIND,
                    entries = open.index.len(),
                    "bucket closed"
                );
                *state = State::Closed {
                    name: Some(open.name),
                };
                flushed
            }
            State::Closed { name } => {
                let label = name.clone().unwrap_or_else(|| "<unopened>".to_string());
                *state = State::Closed { name };
                Err(StoreError::NotOpen(label))
            }
        }
    }

    /// True while the bucket is open.
    pub fn is_open(&self) -> bool {
        matches!(&*self.state.read(), State::Open(_))
    }

    /// Number of entries stored, or 0 when closed.
    pub fn len(&self) -> usize {
        match &*self.state.read() {
            State::Open(open) => open.index.len(),
            State::Closed { .. } => 0,
        }
    }

    /// True when the bucket is closed or holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Logical name, if the bucket was ever initialized.
    pub fn name(&self) -> Option<String> {
        match &*self.state.read() {
            State::Open(open) => Some(open.name.clone()),
            State::Closed { name } => name.clone(),
        }
    }

    fn with_open<R>(&self, f: impl FnOnce(&OpenBucket) -> Result<R>) -> Result<R> {
        let state = self.state.read();
        match &*state {
            State::Open(open) => f(open),
            State::Closed { name } => Err(StoreError::NotOpen(
                name.clone().unwrap_or_else(|| "<unopened>".to_string()),
            )),
        }
    }
}

impl<T: Codec> std::fmt::Debug for Bucket<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("kind", &T::KIND)
            .field("name", &self.name())
            .field("open", &self.is_open())
            .field("entries", &self.len())
            .finish()
    }
}
