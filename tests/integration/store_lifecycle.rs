#![allow(missing_docs)]

use std::sync::Arc;

use exhash::{
    CounterMetrics, Directory, HashKind, IoMetrics, IoStats, KeyHash, Record, StoreError,
    StoreOptions,
};
use tempfile::TempDir;

#[test]
fn remove_then_get_reports_not_found() {
    let tmp = TempDir::new().unwrap();
    let mut dir = Directory::create(tmp.path().join("s.db"), 4).unwrap();
    dir.add(Record::new(11, 1, 2, 3)).unwrap();
    let removed = dir.remove(11).unwrap();
    assert_eq!(removed.as_ints(), [11, 1, 2, 3]);
    let err = dir.get(11).unwrap_err();
    assert!(matches!(err, StoreError::RecordNotFound { key: 11 }));
    assert_eq!(err.to_string(), "record with key 11 not found");
}

#[test]
fn update_replaces_payload_only() {
    let tmp = TempDir::new().unwrap();
    let mut dir = Directory::create(tmp.path().join("s.db"), 4).unwrap();
    dir.add(Record::new(3, 1, 1, 1)).unwrap();
    dir.update(Record::new(3, 4, 5, 6)).unwrap();
    assert_eq!(dir.get(3).unwrap().as_ints(), [3, 4, 5, 6]);
    assert_eq!(dir.records().unwrap().len(), 1);
}

#[test]
fn removed_slots_are_reused_without_splitting() {
    let tmp = TempDir::new().unwrap();
    let mut dir = Directory::create(tmp.path().join("s.db"), 2).unwrap();
    dir.add(Record::new(1, 0, 0, 0)).unwrap();
    dir.add(Record::new(2, 0, 0, 0)).unwrap();
    dir.remove(1).unwrap();
    dir.add(Record::new(3, 0, 0, 0)).unwrap();
    assert_eq!(dir.global_depth(), 0);
    assert_eq!(dir.page_count().unwrap(), 1);
}

#[test]
fn operations_feed_injected_counters() {
    let tmp = TempDir::new().unwrap();
    let metrics = Arc::new(CounterMetrics::default());
    let hasher: Arc<dyn KeyHash> = Arc::new(HashKind::Identity);
    let mut dir = Directory::open_with(
        tmp.path().join("s.db"),
        StoreOptions::default().page_size(4),
        hasher,
        metrics.clone(),
    )
    .unwrap();
    assert_eq!(metrics.snapshot(), IoStats { reads: 0, writes: 1 });

    // Duplicate check plus the insert itself.
    dir.add(Record::new(1, 0, 0, 0)).unwrap();
    assert_eq!(metrics.snapshot(), IoStats { reads: 2, writes: 2 });

    dir.get(1).unwrap();
    dir.update(Record::new(1, 2, 2, 2)).unwrap();
    dir.remove(1).unwrap();
    assert_eq!(metrics.snapshot(), IoStats { reads: 5, writes: 4 });

    dir.dump_file().unwrap();
    dir.records().unwrap();
    dir.verify().unwrap();
    assert_eq!(metrics.snapshot(), IoStats { reads: 5, writes: 4 });
    assert_eq!(dir.stats(), metrics.snapshot());
}

#[test]
fn uncounted_store_reports_nothing() {
    let tmp = TempDir::new().unwrap();
    let options = StoreOptions::default().page_size(2).count_io(false);
    let mut dir = Directory::open(tmp.path().join("s.db"), options).unwrap();
    for key in 0..20 {
        dir.add(Record::new(key, 0, 0, 0)).unwrap();
    }
    assert_eq!(dir.stats(), IoStats::default());
}

#[test]
fn reopen_keeps_records_and_accepts_new_ones() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("s.db");
    let options = StoreOptions::durable().page_size(3).hash(HashKind::Jenkins);
    let mut dir = Directory::open(&path, options.clone()).unwrap();
    for key in 0..50 {
        dir.add(Record::new(key, key * 2, 0, 0)).unwrap();
    }
    for key in (0..50).step_by(5) {
        dir.remove(key).unwrap();
    }
    let depth = dir.global_depth();
    dir.close().unwrap();

    let mut dir = Directory::open(&path, options.clone().truncate(false)).unwrap();
    assert_eq!(dir.global_depth(), depth);
    assert!(dir.verify().unwrap().is_clean());
    for key in 0..50 {
        match dir.find(key).unwrap() {
            Some(record) => {
                assert_ne!(key % 5, 0);
                assert_eq!(record.a, key * 2);
            }
            None => assert_eq!(key % 5, 0),
        }
    }
    for key in 50..80 {
        dir.add(Record::new(key, 0, 0, 0)).unwrap();
    }
    assert!(dir.verify().unwrap().is_clean());
    assert_eq!(dir.records().unwrap().len(), 40 + 30);
    drop(dir);

    let dir = Directory::open(&path, options).unwrap();
    assert_eq!(dir.page_count().unwrap(), 1);
    assert_eq!(dir.global_depth(), 0);
}

#[test]
fn zero_page_size_is_rejected() {
    let tmp = TempDir::new().unwrap();
    assert!(matches!(
        Directory::create(tmp.path().join("s.db"), 0),
        Err(StoreError::InvalidArgument(_))
    ));
}
