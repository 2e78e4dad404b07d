//! Tag chain index: tag -> chain tail.
//!
//! Purely in-memory and consulted only at write time, to link a new
//! entry to the current tail of its tag. Derived state: it is rebuilt
//! from the persisted chain slots on open and must produce the same
//! answers as a bucket that was never closed.

use crate::index::{IdIndex, NIL_SLOT};
use dashmap::DashMap;
use tracing::{debug, warn};

/// Mapping from tag to the ordinal of the most recently stored entry
/// under that tag.
#[derive(Debug, Default)]
pub struct TagChains {
    tails: DashMap<String, u64>,
}

impl TagChains {
    /// Create an empty chain index.
    pub fn new() -> Self {
        TagChains {
            tails: DashMap::new(),
        }
    }

    /// Current tail ordinal for `tag`, if any entry was stored under it.
    pub fn tail(&self, tag: &str) -> Option<u64> {
        self.tails.get(tag).map(|entry| *entry.value())
    }

    /// Record `no` as the new tail of `tag`'s chain.
    pub fn set_tail(&self, tag: &str, no: u64) {
        self.tails.insert(tag.to_string(), no);
    }

    /// Number of distinct tags with at least one entry.
    pub fn len(&self) -> usize {
        self.tails.len()
    }

    /// True when no chain exists yet.
    pub fn is_empty(&self) -> bool {
        self.tails.is_empty()
    }

    /// Rebuild the tail map from persisted chain slots.
    ///
    /// The tail of each tag is the slot with no outgoing `next`. Two
    /// tailless slots under one tag mean the persisted chain is broken;
    /// the higher ordinal wins and the anomaly is logged.
    pub fn rebuild(&self, index: &IdIndex) {
        self.tails.clear();
        index.for_each(|slot| {
            if slot.next() != NIL_SLOT {
                return;
            }
            match self.tails.entry(slot.tag().to_string()) {
                dashmap::mapref::entry::Entry::Vacant(entry) => {
                    entry.insert(slot.no());
                }
                dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                    let kept = (*entry.get()).max(slot.no());
                    warn!(tag = slot.tag(), kept, "multiple chain tails for one tag");
                    entry.insert(kept);
                }
            }
        });
        debug!(tags = self.len(), "tag chains rebuilt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spandb_core::Location;
    use tempfile::TempDir;

    #[test]
    fn tail_tracking() {
        let chains = TagChains::new();
        assert!(chains.tail("tag0").is_none());

        chains.set_tail("tag0", 0);
        chains.set_tail("tag1", 1);
        chains.set_tail("tag0", 2);

        assert_eq!(chains.tail("tag0"), Some(2));
        assert_eq!(chains.tail("tag1"), Some(1));
        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn rebuild_picks_tailless_slots() {
        let dir = TempDir::new().unwrap();
        let index = IdIndex::open(dir.path().join("test.idx")).unwrap();

        // tag0: id0 -> id1 (tail id1); tag1: id2 alone.
        let head = index
            .insert("id0", "tag0", Location::new(0, 6), NIL_SLOT)
            .unwrap();
        let tail = index
            .insert("id1", "tag0", Location::new(14, 6), head.no())
            .unwrap();
        index.set_next(&head, tail.no()).unwrap();
        let solo = index
            .insert("id2", "tag1", Location::new(28, 6), NIL_SLOT)
            .unwrap();

        let chains = TagChains::new();
        chains.rebuild(&index);
        assert_eq!(chains.tail("tag0"), Some(tail.no()));
        assert_eq!(chains.tail("tag1"), Some(solo.no()));
        assert!(chains.tail("tag2").is_none());
    }

    #[test]
    fn rebuild_clears_stale_tails() {
        let dir = TempDir::new().unwrap();
        let index = IdIndex::open(dir.path().join("test.idx")).unwrap();
        index
            .insert("id0", "tag0", Location::new(0, 6), NIL_SLOT)
            .unwrap();

        let chains = TagChains::new();
        chains.set_tail("stale", 99);
        chains.rebuild(&index);
        assert!(chains.tail("stale").is_none());
        assert_eq!(chains.tail("tag0"), Some(0));
    }
}
