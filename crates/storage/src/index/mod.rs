//! Persistent id index with in-place-updatable chain slots.
//!
//! The index maps every entry id to its data-log location and its chain
//! slot (tag, prev, next). Inserts append a record to the index file;
//! the only in-place mutation is patching a predecessor's `next` field
//! when a chain grows.
//!
//! ## Design
//!
//! Lookups never touch the file: the whole index is mirrored in memory
//! (it is rebuilt by scanning the file on open) and chain pointers are
//! plain `AtomicU64`s holding slot ordinals. A pointer update is one
//! atomic store in memory plus one 8-byte positioned write on disk, so
//! a concurrent reader observes either the old or the new pointer,
//! never a torn one.

mod format;

pub use format::{SlotRecord, INDEX_HEADER_LEN, INDEX_MAGIC, INDEX_VERSION, NIL_SLOT};

use crate::fs::{read_exact_at, write_all_at};
use dashmap::DashMap;
use format::{
    check_header, decode_record, encode_record, header_bytes, links_offset, DecodeOutcome,
};
use parking_lot::Mutex;
use spandb_core::{Location, Result, StoreError};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// In-memory image of one persisted chain slot.
///
/// Shared between the id map and the ordinal map as `Arc<Slot>`; the
/// chain pointers are the only mutable fields.
pub struct Slot {
    no: u64,
    id: String,
    tag: String,
    location: Location,
    prev: AtomicU64,
    next: AtomicU64,
    /// File offset of the `prev` field; `next` sits 8 bytes after.
    links_pos: u64,
}

impl Slot {
    /// Ordinal of this slot in file order.
    pub fn no(&self) -> u64 {
        self.no
    }

    /// Entry id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Tag the entry was stored under.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Payload location in the data log.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Ordinal of the chain predecessor, [`NIL_SLOT`] at the head.
    pub fn prev(&self) -> u64 {
        self.prev.load(Ordering::Acquire)
    }

    /// Ordinal of the chain successor, [`NIL_SLOT`] at the tail.
    pub fn next(&self) -> u64 {
        self.next.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slot")
            .field("no", &self.no)
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("location", &self.location)
            .field("prev", &self.prev())
            .field("next", &self.next())
            .finish()
    }
}

/// Persistent mapping from id to (location, chain slot).
pub struct IdIndex {
    file: File,
    path: PathBuf,
    /// Append position; inserts are serialized by the owning bucket.
    end: Mutex<u64>,
    by_id: DashMap<String, Arc<Slot>>,
    by_no: DashMap<u64, Arc<Slot>>,
    next_no: AtomicU64,
}

impl IdIndex {
    /// Open the index at `path`, creating it if absent, and rebuild the
    /// in-memory maps by scanning every persisted record.
    ///
    /// A checksum mismatch mid-file is corruption and fails the open. An
    /// incomplete trailing record (torn final append) is dropped with a
    /// warning; the next insert overwrites it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&path)?;
        let file_len = file.metadata()?.len();

        let index = IdIndex {
            file,
            path,
            end: Mutex::new(INDEX_HEADER_LEN),
            by_id: DashMap::new(),
            by_no: DashMap::new(),
            next_no: AtomicU64::new(0),
        };

        if file_len == 0 {
            write_all_at(&index.file, &header_bytes(), 0)?;
        } else {
            index.scan(file_len)?;
        }

        debug!(
            path = %index.path.display(),
            slots = index.len(),
            "id index opened"
        );
        Ok(index)
    }

    /// Rebuild the in-memory maps from the file contents.
    fn scan(&self, file_len: u64) -> Result<()> {
        let mut buf = vec![0u8; file_len as usize];
        read_exact_at(&self.file, &mut buf, 0)?;
        check_header(&buf)?;

        let mut pos = INDEX_HEADER_LEN as usize;
        while pos < buf.len() {
            match decode_record(&buf[pos..]).map_err(|e| {
                StoreError::Corruption(format!("index record at offset {}: {}", pos, e))
            })? {
                DecodeOutcome::Record { record, consumed } => {
                    let links_pos = pos as u64 + links_offset(record.id.len(), record.tag.len()) as u64;
                    self.register(record, links_pos)?;
                    pos += consumed;
                }
                DecodeOutcome::Incomplete => {
                    warn!(
                        path = %self.path.display(),
                        offset = pos,
                        trailing = buf.len() - pos,
                        "dropping incomplete trailing index record"
                    );
                    break;
                }
            }
        }

        *self.end.lock() = pos as u64;
        Ok(())
    }

    /// Register one slot built from a persisted record.
    fn register(&self, record: SlotRecord, links_pos: u64) -> Result<()> {
        let no = self.next_no.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(Slot {
            no,
            id: record.id,
            tag: record.tag,
            location: record.location,
            prev: AtomicU64::new(record.prev),
            next: AtomicU64::new(record.next),
            links_pos,
        });
        if self
            .by_id
            .insert(slot.id.clone(), Arc::clone(&slot))
            .is_some()
        {
            return Err(StoreError::Corruption(format!(
                "duplicate id {:?} in index file",
                slot.id
            )));
        }
        self.by_no.insert(no, slot);
        Ok(())
    }

    /// Insert a new entry with its chain predecessor already linked.
    ///
    /// The caller passes `prev` as the current tail of the entry's tag
    /// chain ([`NIL_SLOT`] for a fresh chain); the new slot's `next` is
    /// always [`NIL_SLOT`] since it becomes the tail.
    pub fn insert(
        &self,
        id: &str,
        tag: &str,
        location: Location,
        prev: u64,
    ) -> Result<Arc<Slot>> {
        if self.by_id.contains_key(id) {
            return Err(StoreError::DuplicateId(id.to_string()));
        }

        let record = SlotRecord {
            id: id.to_string(),
            tag: tag.to_string(),
            location,
            prev,
            next: NIL_SLOT,
        };
        let buf = encode_record(&record)?;

        let mut end = self.end.lock();
        let record_pos = *end;
        write_all_at(&self.file, &buf, record_pos)?;
        *end = record_pos + buf.len() as u64;
        drop(end);

        let links_pos = record_pos + links_offset(id.len(), tag.len()) as u64;
        let no = self.next_no.fetch_add(1, Ordering::Relaxed);
        let slot = Arc::new(Slot {
            no,
            id: id.to_string(),
            tag: tag.to_string(),
            location,
            prev: AtomicU64::new(prev),
            next: AtomicU64::new(NIL_SLOT),
            links_pos,
        });
        self.by_id.insert(id.to_string(), Arc::clone(&slot));
        self.by_no.insert(no, Arc::clone(&slot));
        Ok(slot)
    }

    /// Point `slot`'s `next` at another ordinal, on disk and in memory.
    ///
    /// The disk write lands before the atomic store publishes the new
    /// pointer, so a reader that sees the pointer can always resolve it.
    pub fn set_next(&self, slot: &Slot, next: u64) -> Result<()> {
        write_all_at(&self.file, &next.to_le_bytes(), slot.links_pos + 8)?;
        slot.next.store(next, Ordering::Release);
        Ok(())
    }

    /// Look up a slot by entry id.
    pub fn get(&self, id: &str) -> Option<Arc<Slot>> {
        self.by_id.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a slot by ordinal.
    pub fn slot(&self, no: u64) -> Option<Arc<Slot>> {
        self.by_no.get(&no).map(|entry| Arc::clone(entry.value()))
    }

    /// True when an entry with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Number of entries in the index.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// True when the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Visit every slot; used to rebuild the tag chain index on open.
    pub fn for_each(&self, mut f: impl FnMut(&Slot)) {
        for entry in self.by_no.iter() {
            f(entry.value());
        }
    }

    /// Flush all index writes to disk.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for IdIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdIndex")
            .field("path", &self.path)
            .field("slots", &self.len())
            .finish()
    }
}
