#![allow(missing_docs)]

use std::fs;

use exhash::pager::{block_size, PAGE_HEADER_SIZE};
use exhash::types::{DELETED_KEY, EMPTY_KEY, RECORD_SIZE};
use exhash::{Directory, Record};
use tempfile::TempDir;

fn ints(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[test]
fn blocks_are_header_plus_fixed_records() {
    assert_eq!(PAGE_HEADER_SIZE, 8);
    assert_eq!(RECORD_SIZE, 16);
    assert_eq!(block_size(4), 72);
    assert_eq!(block_size(100), 1608);
}

#[test]
fn fresh_file_holds_one_empty_page() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("f.db");
    Directory::create(&path, 2).unwrap().close().unwrap();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(bytes.len(), block_size(2));
    assert_eq!(ints(&bytes[..8]), vec![0, 0]);
    assert!(ints(&bytes[8..]).chunks(4).all(|r| r[0] == EMPTY_KEY));
}

#[test]
fn split_pages_land_at_block_offsets() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("f.db");
    let mut dir = Directory::create(&path, 4).unwrap();
    for key in 1..=5 {
        dir.add(Record::new(key, key * 10, key * 100, -key)).unwrap();
    }
    dir.close().unwrap();

    let bytes = fs::read(&path).unwrap();
    let block = block_size(4);
    assert_eq!(bytes.len(), 2 * block);

    let first = ints(&bytes[..block]);
    assert_eq!(&first[..2], &[2, 1]);
    assert_eq!(&first[2..6], &[2, 20, 200, -2]);
    assert_eq!(&first[6..10], &[4, 40, 400, -4]);

    let second = ints(&bytes[block..]);
    assert_eq!(&second[..2], &[3, 1]);
    let keys: Vec<i32> = second[2..].chunks(4).map(|r| r[0]).collect();
    assert_eq!(keys, vec![1, 3, 5, EMPTY_KEY]);
}

#[test]
fn removal_leaves_tombstone_past_count() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("f.db");
    let mut dir = Directory::create(&path, 3).unwrap();
    for key in [5, 6, 7] {
        dir.add(Record::new(key, 0, 0, 0)).unwrap();
    }
    dir.remove(5).unwrap();
    dir.close().unwrap();

    let bytes = fs::read(&path).unwrap();
    let values = ints(&bytes);
    assert_eq!(values[0], 2);
    let keys: Vec<i32> = values[2..].chunks(4).map(|r| r[0]).collect();
    assert_eq!(keys, vec![6, 7, DELETED_KEY]);
}

#[test]
fn file_dump_reports_every_page() {
    let tmp = TempDir::new().unwrap();
    let mut dir = Directory::create(tmp.path().join("f.db"), 4).unwrap();
    for key in 1..=5 {
        dir.add(Record::new(key, 0, 0, 0)).unwrap();
    }
    let dump = dir.dump_file().unwrap();
    assert_eq!(dump.pages.len(), 2);
    assert_eq!(dump.record_count(), 5);
    let text = dump.to_string();
    assert!(text.contains("#P:0, d:1, k:0#"));
    assert!(text.contains("#P:1, d:1, k:1#"));
    assert!(text.contains(&format!("[{:032b}] 5 => 0 0 0", 5)));
}
