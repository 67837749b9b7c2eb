#![allow(missing_docs)]

use std::collections::BTreeSet;

use exhash::{AddOutcome, Directory, HashKind, Record, StoreOptions};
use tempfile::TempDir;

fn open(page_size: usize, hash: HashKind) -> (TempDir, Directory) {
    let tmp = TempDir::new().expect("tempdir");
    let options = StoreOptions::default().page_size(page_size).hash(hash);
    let dir = Directory::open(tmp.path().join("split.db"), options).expect("open store");
    (tmp, dir)
}

fn page_count_of(dir: &Directory) -> usize {
    dir.entries()
        .iter()
        .filter_map(|e| e.page)
        .collect::<BTreeSet<_>>()
        .len()
}

#[test]
fn page_size_four_overflow_splits_once() {
    let (_tmp, mut dir) = open(4, HashKind::Identity);
    for key in 1..=4 {
        dir.add(Record::new(key, 0, 0, 0)).unwrap();
    }
    assert_eq!(dir.global_depth(), 0);
    assert_eq!(dir.page_count().unwrap(), 1);

    dir.add(Record::new(5, 0, 0, 0)).unwrap();
    assert_eq!(dir.global_depth(), 1);
    assert_eq!(dir.page_count().unwrap(), 2);
    for key in 1..=5 {
        assert_eq!(dir.get(key).unwrap().key, key);
    }
}

#[test]
fn overflow_below_global_depth_splits_without_growth() {
    let (_tmp, mut dir) = open(4, HashKind::Identity);
    for key in [2, 4, 6, 8] {
        dir.add(Record::new(key, 0, 0, 0)).unwrap();
    }
    dir.add(Record::new(1, 0, 0, 0)).unwrap();
    assert_eq!(dir.global_depth(), 1);
    assert_eq!(dir.page_count().unwrap(), 2);
    assert_eq!(dir.get(1).unwrap().key, 1);

    // The even page forces growth; the odd page then splits under it.
    dir.add(Record::new(10, 0, 0, 0)).unwrap();
    assert_eq!(dir.global_depth(), 2);
    let pages_before = dir.page_count().unwrap();
    for key in [3, 5, 7, 9] {
        dir.add(Record::new(key, 0, 0, 0)).unwrap();
    }
    assert_eq!(dir.global_depth(), 2);
    assert_eq!(dir.page_count().unwrap(), pages_before + 1);
    assert_eq!(dir.entries()[1].page, Some(1));
    assert_eq!(dir.entries()[3].page, Some(pages_before));
    assert!(dir.verify().unwrap().is_clean());
}

#[test]
fn repeated_splits_keep_every_key_reachable() {
    for hash in HashKind::ALL {
        let (_tmp, mut dir) = open(3, hash);
        let keys: Vec<i32> = (0..200).map(|i| i * 7 - 300).collect();
        for &key in &keys {
            assert_eq!(
                dir.add(Record::new(key, key, -key, 1)).unwrap(),
                AddOutcome::Inserted,
                "{hash}: key {key}"
            );
        }
        assert!(dir.global_depth() >= 2, "{hash}");
        for &key in &keys {
            let record = dir.get(key).unwrap();
            assert_eq!(record.as_ints(), [key, key, -key, 1], "{hash}");
        }
        let report = dir.verify().unwrap();
        assert!(report.is_clean(), "{hash}: {:?}", report.issues);
        assert_eq!(report.entries_checked, dir.entries().len());
        assert_eq!(dir.records().unwrap().len(), keys.len());
    }
}

#[test]
fn directory_slots_alias_shallow_pages() {
    let (_tmp, mut dir) = open(2, HashKind::Identity);
    for key in [0, 4, 8, 1] {
        dir.add(Record::new(key, 0, 0, 0)).unwrap();
    }
    let global = dir.global_depth();
    assert_eq!(dir.entries().len(), 1 << global);
    assert!(page_count_of(&dir) < dir.entries().len());
    for entry in dir.entries() {
        assert!(entry.page.is_some(), "slot {} unassigned", entry.index);
    }
    let dump = dir.dump_directory().to_string();
    assert!(dump.starts_with(&format!("--------------\n#D{global}#\n")));
    assert_eq!(dump.lines().count(), 2 + dir.entries().len());
}
