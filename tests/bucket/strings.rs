//! String payloads with default round-robin tag assignment.
//!
//! Untagged stores shard over 10 partitions, so ids `i` and `i + 10`
//! (same `i % 10`) land in one chain.

use spandb::prelude::*;
use tempfile::TempDir;

#[test]
fn string_bucket_default_partitioning() {
    let dir = TempDir::new().unwrap();
    let manager = BucketManager::with_base_dir(dir.path());
    let bucket = manager.string_bucket("data").unwrap();

    // store it and load it
    for i in 0..100 {
        let id = format!("id{}", i);
        let value = format!("value{}", i);
        assert!(bucket.store_by_id(&id, &value), "store failed at i={}", i);
        assert_eq!(bucket.find_by_id(&id).unwrap(), Some(value));
    }

    // close and reload it, check if everything is okay
    bucket.close().unwrap();
    bucket.initialize(dir.path(), "data").unwrap();

    for i in 0..100 {
        let id = format!("id{}", i);
        assert_eq!(
            bucket.find_by_id(&id).unwrap(),
            Some(format!("value{}", i))
        );
    }

    for i in 0..90 {
        let id = format!("id{}", i);
        let tag = format!("tag{}", i % 10);
        assert_eq!(
            bucket.find_next_by_id(&id, &tag).unwrap(),
            Some(format!("value{}", i + 10)),
            "wrong next entry for i={}",
            i
        );
    }

    for i in 10..100 {
        let id = format!("id{}", i);
        let tag = format!("tag{}", i % 10);
        assert_eq!(
            bucket.find_previous_by_id(&id, &tag).unwrap(),
            Some(format!("value{}", i - 10)),
            "wrong previous entry for i={}",
            i
        );
    }
}

#[test]
fn chain_boundaries_are_absent_results() {
    let dir = TempDir::new().unwrap();
    let manager = BucketManager::with_base_dir(dir.path());
    let bucket = manager.string_bucket("edges").unwrap();

    for i in 0..20 {
        assert!(bucket.store_by_id(&format!("id{}", i), &format!("value{}", i)));
    }

    // Ids 10..19 are each partition's tail, ids 0..9 each head.
    for i in 10..20 {
        let tag = format!("tag{}", i % 10);
        assert_eq!(bucket.find_next_by_id(&format!("id{}", i), &tag).unwrap(), None);
    }
    for i in 0..10 {
        let tag = format!("tag{}", i % 10);
        assert_eq!(
            bucket.find_previous_by_id(&format!("id{}", i), &tag).unwrap(),
            None
        );
    }
}

#[test]
fn mismatched_tag_is_a_contract_violation() {
    let dir = TempDir::new().unwrap();
    let manager = BucketManager::with_base_dir(dir.path());
    let bucket = manager.string_bucket("contract").unwrap();

    assert!(bucket.store_by_id_with_tag("id0", &"value0".to_string(), "r:0"));
    let err = bucket.find_next_by_id("id0", "r:1").unwrap_err();
    assert!(matches!(err, StoreError::TagMismatch { .. }));
}
