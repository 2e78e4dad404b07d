//! Raw byte payloads: store, read back, reload.

use spandb::prelude::*;
use tempfile::TempDir;

#[test]
fn bytes_bucket_roundtrip_and_reload() {
    let dir = TempDir::new().unwrap();
    let manager = BucketManager::with_base_dir(dir.path());
    let bucket = manager.bytes_bucket("bytes").unwrap();

    // store it and load it
    for i in 0..100 {
        let id = format!("id{}", i);
        let value = format!("value{}", i).into_bytes();
        assert!(bucket.store_by_id(&id, &value), "store failed at i={}", i);
        assert_eq!(
            bucket.find_by_id(&id).unwrap(),
            Some(value),
            "unable to find data after storing it at i={}",
            i
        );
    }

    // close and reload it, check if everything is okay
    bucket.close().unwrap();
    bucket.initialize(dir.path(), "bytes").unwrap();

    for i in 0..100 {
        let id = format!("id{}", i);
        let value = format!("value{}", i).into_bytes();
        assert_eq!(bucket.find_by_id(&id).unwrap(), Some(value));
    }
}

#[test]
fn binary_payloads_survive_unmodified() {
    let dir = TempDir::new().unwrap();
    let manager = BucketManager::with_base_dir(dir.path());
    let bucket = manager.bytes_bucket("binary").unwrap();

    let value: Vec<u8> = (0..=255).collect();
    assert!(bucket.store_by_id("all-bytes", &value));
    assert_eq!(bucket.find_by_id("all-bytes").unwrap(), Some(value));
}
