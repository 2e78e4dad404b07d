//! Structured trace messages chained per trace.
//!
//! 100 spans spread over 10 explicit `r:<n>` tags; walking `next` from
//! id `i*10 + i` under tag `r:<i>` lands on id `(i+1)*10 + i`, before
//! and after a close/reinitialize cycle.

use spandb::prelude::*;
use tempfile::TempDir;

fn new_span(id: &str) -> SpanRecord {
    SpanRecord {
        domain: "domain".into(),
        hostname: "hostName".into(),
        ip_address: "ipAddress".into(),
        message_id: id.into(),
        parent_message_id: "parentMessageId".into(),
        root_message_id: "rootMessageId".into(),
        session_token: "sessionToken".into(),
        thread_id: "threadId".into(),
        thread_name: "threadName".into(),
        timestamp_ms: 1_700_000_000_000,
    }
}

fn check_next_links(bucket: &Bucket<SpanRecord>, groups: usize) {
    for i in 0..groups - 1 {
        let id = format!("id{}", i * groups + i);
        let next_id = format!("id{}", (i + 1) * groups + i);
        let tag = format!("r:{}", i);

        let via_chain = bucket
            .find_next_by_id(&id, &tag)
            .unwrap()
            .unwrap_or_else(|| panic!("no next span in chain {}", i));
        let via_lookup = bucket.find_by_id(&next_id).unwrap().unwrap();
        assert_eq!(via_chain, via_lookup, "wrong next span in chain {}", i);
    }
}

#[test]
fn span_bucket_chains_per_trace() {
    let dir = TempDir::new().unwrap();
    let manager = BucketManager::with_base_dir(dir.path());
    let bucket = manager.span_bucket("message").unwrap();
    let groups = 10;

    // store it and load it
    for i in 0..100 {
        let id = format!("id{}", i);
        let span = new_span(&id);
        let tag = format!("r:{}", i % groups);
        assert!(
            bucket.store_by_id_with_tag(&id, &span, &tag),
            "span failed to store at i={}",
            i
        );
        assert_eq!(bucket.find_by_id(&id).unwrap(), Some(span));
    }

    // check next message in the same trace
    check_next_links(&bucket, groups);

    // close and reload it, check if everything is okay
    bucket.close().unwrap();
    bucket.initialize(dir.path(), "message").unwrap();

    check_next_links(&bucket, groups);
}

#[test]
fn duplicate_span_id_preserves_the_first_store() {
    let dir = TempDir::new().unwrap();
    let manager = BucketManager::with_base_dir(dir.path());
    let bucket = manager.span_bucket("dupes").unwrap();

    let original = new_span("id0");
    let mut replacement = new_span("id0");
    replacement.domain = "other".into();

    assert!(bucket.store_by_id_with_tag("id0", &original, "r:0"));
    assert!(!bucket.store_by_id_with_tag("id0", &replacement, "r:0"));
    assert_eq!(bucket.find_by_id("id0").unwrap(), Some(original));
}
