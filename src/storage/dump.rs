//! Printable snapshots of the directory and the page file.

use std::fmt;

use crate::pager::{Page, PageNo};
use crate::primitives::hash::KeyHash;
use crate::storage::directory::DirEntry;
use crate::types::Record;

const RULE: &str = "--------------";

/// The directory as seen by [`super::Directory::dump_directory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryDump {
    /// Global depth at the time of the dump.
    pub global_depth: u32,
    /// One entry per directory slot.
    pub entries: Vec<DirEntry>,
}

impl fmt::Display for DirectoryDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "#D{}#", self.global_depth)?;
        let width = self.global_depth as usize;
        for entry in &self.entries {
            match entry.page {
                Some(page) => writeln!(f, "{:0width$b} | {page}", entry.index)?,
                None => writeln!(f, "{:0width$b} | [-]", entry.index)?,
            }
        }
        Ok(())
    }
}

/// A live record together with its full hash.
#[derive(Debug, Clone, Copy)]
pub struct RecordDump {
    /// The stored record.
    pub record: Record,
    /// Hash of the record's key.
    pub hash: i32,
}

impl RecordDump {
    /// Pairs `record` with its key's hash under `hasher`.
    pub fn new(record: Record, hasher: &dyn KeyHash) -> Self {
        Self {
            record,
            hash: hasher.hash(record.key),
        }
    }
}

impl fmt::Display for RecordDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:032b}] {}", self.hash as u32, self.record)
    }
}

/// One page of a [`FileDump`].
#[derive(Debug, Clone)]
pub struct PageDump {
    /// Page number.
    pub number: PageNo,
    /// Local depth.
    pub depth: u32,
    /// Bucket of the first key at the page's own depth; `None` when empty.
    pub bucket: Option<usize>,
    /// Live records in slot order.
    pub records: Vec<RecordDump>,
}

impl PageDump {
    /// Captures `page`, hashing its keys with `hasher`.
    pub fn from_page(page: &Page, hasher: &dyn KeyHash) -> Self {
        Self {
            number: page.number(),
            depth: page.depth(),
            bucket: page
                .first_key()
                .map(|key| hasher.bucket_index(key, page.depth())),
            records: page
                .live()
                .iter()
                .map(|record| RecordDump::new(*record, hasher))
                .collect(),
        }
    }
}

impl fmt::Display for PageDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.depth as usize;
        match self.bucket {
            Some(bucket) => writeln!(
                f,
                "#P:{}, d:{}, k:{:0width$b}#",
                self.number, self.depth, bucket
            )?,
            None => writeln!(f, "#P:{}, d:{}, k:-#", self.number, self.depth)?,
        }
        for record in &self.records {
            writeln!(f, "{record}")?;
        }
        Ok(())
    }
}

/// Every page of the file in order.
#[derive(Debug, Clone)]
pub struct FileDump {
    /// Pages by ascending number.
    pub pages: Vec<PageDump>,
}

impl FileDump {
    /// Total live records across all pages.
    pub fn record_count(&self) -> usize {
        self.pages.iter().map(|page| page.records.len()).sum()
    }
}

impl fmt::Display for FileDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        for page in &self.pages {
            write!(f, "{page}")?;
        }
        Ok(())
    }
}
