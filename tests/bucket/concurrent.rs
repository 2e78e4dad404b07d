//! Readers racing a writer on one bucket.
//!
//! Readers must never block each other and must never observe a torn
//! chain pointer: every `find_next_by_id` during the write burst either
//! resolves a complete neighbor or reports an absent result.

use spandb::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn readers_see_only_complete_links_during_writes() {
    let dir = TempDir::new().unwrap();
    let manager = BucketManager::with_base_dir(dir.path());
    let bucket = manager.string_bucket("live").unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let bucket = Arc::clone(&bucket);
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            for i in 0..500 {
                assert!(bucket.store_by_id_with_tag(
                    &format!("id{}", i),
                    &format!("value{}", i),
                    "stream",
                ));
            }
            done.store(true, Ordering::Release);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let bucket = Arc::clone(&bucket);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                let mut observed = 0u64;
                while !done.load(Ordering::Acquire) {
                    for i in 0..500 {
                        let id = format!("id{}", i);
                        // Unknown ids and chain tails are absent results;
                        // anything else must decode cleanly.
                        if let Some(value) = bucket.find_next_by_id(&id, "stream").unwrap() {
                            assert_eq!(value, format!("value{}", i + 1));
                            observed += 1;
                        }
                    }
                }
                observed
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    // After the burst the chain is fully linked.
    for i in 0..499 {
        assert_eq!(
            bucket.find_next_by_id(&format!("id{}", i), "stream").unwrap(),
            Some(format!("value{}", i + 1))
        );
    }
    assert_eq!(bucket.find_next_by_id("id499", "stream").unwrap(), None);
}

#[test]
fn stores_and_lookups_interleave_across_buckets() {
    let dir = TempDir::new().unwrap();
    let manager = Arc::new(BucketManager::with_base_dir(dir.path()));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let manager = Arc::clone(&manager);
            std::thread::spawn(move || {
                let bucket = manager.string_bucket("shared").unwrap();
                for i in 0..100 {
                    let id = format!("t{}-id{}", t, i);
                    assert!(bucket.store_by_id_with_tag(
                        &id,
                        &format!("t{}-value{}", t, i),
                        &format!("t{}", t),
                    ));
                    assert_eq!(
                        bucket.find_by_id(&id).unwrap(),
                        Some(format!("t{}-value{}", t, i))
                    );
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let bucket = manager.string_bucket("shared").unwrap();
    assert_eq!(bucket.len(), 400);
    manager.close_all().unwrap();
}
