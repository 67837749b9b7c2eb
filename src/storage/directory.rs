//! Extendible-hash directory over a file of fixed-size pages.
//!
//! The directory maps the low `global_depth` bits of a key's hash to the page
//! owning that bucket. A page of local depth `d` is shared by every directory
//! index whose low `d` bits match its records' hashes. When a page overflows
//! it is split on hash bit `d`; if `d` already equals the global depth the
//! directory doubles first, rebuilt by rescanning the file.
//!
//! The directory lives in memory only. Reopening an existing file rebuilds it
//! from the pages on disk.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::pager::{Page, PageFile, PageNo, PageReader, PageWriter};
use crate::primitives::hash::KeyHash;
use crate::storage::dump::{DirectoryDump, FileDump, PageDump};
use crate::storage::metrics::{default_metrics, IoMetrics, IoStats};
use crate::storage::options::StoreOptions;
use crate::types::{Record, Result, StoreError};

/// Largest global depth the directory will grow to.
///
/// The directory holds `2^depth` entries in memory, so at the cap it takes
/// about 24 MiB. Keys whose hashes agree on the low `MAX_GLOBAL_DEPTH` bits
/// cannot be separated and fail with [`StoreError::DirectoryFull`] once more
/// than a page of them collide.
pub const MAX_GLOBAL_DEPTH: u32 = 20;

/// One directory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    /// Position of the slot; equal to its array index.
    pub index: usize,
    /// Page owning the bucket, `None` while unassigned.
    pub page: Option<PageNo>,
}

impl DirEntry {
    fn vacant(index: usize) -> Self {
        Self { index, page: None }
    }
}

/// Result of [`Directory::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The record was stored.
    Inserted,
    /// A record with the same key already exists; nothing changed.
    Duplicate,
}

/// Problems found by [`Directory::verify`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Directory slots checked.
    pub entries_checked: usize,
    /// Live records checked.
    pub records_checked: usize,
    /// Human-readable descriptions of every violation.
    pub issues: Vec<String>,
}

impl VerifyReport {
    /// True when no violation was found.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Low `depth` bits of a directory index.
#[inline]
fn prefix(index: usize, depth: u32) -> usize {
    index & ((1usize << depth) - 1)
}

/// Points every slot whose low `depth` bits equal `local` at `page`.
fn scatter(entries: &mut [DirEntry], depth: u32, local: usize, page: PageNo) {
    for entry in entries.iter_mut().filter(|e| prefix(e.index, depth) == local) {
        entry.page = Some(page);
    }
}

/// The extendible-hash store: directory state plus the page file it indexes.
pub struct Directory {
    file: PageFile,
    reader: PageReader,
    scanner: PageReader,
    writer: PageWriter,
    hasher: Arc<dyn KeyHash>,
    metrics: Arc<dyn IoMetrics>,
    count_io: bool,
    global_depth: u32,
    entries: Vec<DirEntry>,
    closed: bool,
}

impl Directory {
    /// Creates a fresh store at `path` holding `page_size` records per page.
    pub fn create(path: impl AsRef<Path>, page_size: usize) -> Result<Self> {
        Self::open(path, StoreOptions::default().page_size(page_size))
    }

    /// Opens a store with the configured hash strategy and a counter sink.
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let hasher: Arc<dyn KeyHash> = Arc::new(options.hash);
        Self::open_with(path, options, hasher, default_metrics())
    }

    /// Opens a store with an explicit hash strategy and metrics sink.
    ///
    /// With `options.truncate` the file starts over with a single empty page
    /// 0. Otherwise existing pages are kept and the directory is rebuilt
    /// from them.
    pub fn open_with(
        path: impl AsRef<Path>,
        options: StoreOptions,
        hasher: Arc<dyn KeyHash>,
        metrics: Arc<dyn IoMetrics>,
    ) -> Result<Self> {
        let file = PageFile::open(path, &options)?;
        let reader = file.reader(metrics.clone(), options.count_io, options.cache_pages);
        let scanner = file.reader(metrics.clone(), false, 1);
        let writer = file.writer(metrics.clone(), options.count_io);
        let mut dir = Self {
            file,
            reader,
            scanner,
            writer,
            hasher,
            metrics,
            count_io: options.count_io,
            global_depth: 0,
            entries: vec![DirEntry::vacant(0)],
            closed: false,
        };

        if dir.file.is_empty()? {
            let first = Page::new(0, 0, dir.page_size());
            dir.writer.write_page(&first)?;
            dir.entries[0].page = Some(first.number());
        } else {
            dir.rebuild()?;
        }
        info!(
            path = %dir.file.path().display(),
            page_size = dir.page_size(),
            global_depth = dir.global_depth,
            "directory.open"
        );
        Ok(dir)
    }

    /// Records per page.
    pub fn page_size(&self) -> usize {
        self.file.page_size()
    }

    /// Number of hash bits currently indexing the directory.
    pub fn global_depth(&self) -> u32 {
        self.global_depth
    }

    /// The directory slots, `2^global_depth` of them.
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    /// Number of page blocks in the file.
    pub fn page_count(&self) -> Result<u64> {
        self.file.page_count()
    }

    /// Read/write totals reported by the metrics sink.
    pub fn stats(&self) -> IoStats {
        self.metrics.snapshot()
    }

    /// Directory index for `key` at the current global depth.
    pub fn bucket_of(&self, key: i32) -> usize {
        if self.global_depth == 0 {
            0
        } else {
            self.hasher.bucket_index(key, self.global_depth)
        }
    }

    /// Looks up `key`.
    pub fn get(&mut self, key: i32) -> Result<Record> {
        let (_, page) = self.load_for(key)?;
        page.get(key)
            .copied()
            .ok_or(StoreError::RecordNotFound { key })
    }

    /// Looks up `key`, mapping the absent outcomes to `None`.
    pub fn find(&mut self, key: i32) -> Result<Option<Record>> {
        match self.get(key) {
            Ok(record) => Ok(Some(record)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Inserts `record`, splitting pages and doubling the directory as needed.
    pub fn add(&mut self, record: Record) -> Result<AddOutcome> {
        if !record.is_live() {
            return Err(StoreError::InvalidArgument(format!(
                "key {} is reserved",
                record.key
            )));
        }
        if self.find(record.key)?.is_some() {
            info!(key = record.key, "record already added");
            return Ok(AddOutcome::Duplicate);
        }
        loop {
            let (index, mut page) = self.load_for(record.key)?;
            if page.add(record) {
                self.writer.write_page(&page)?;
                trace!(key = record.key, page = page.number(), "directory.add");
                return Ok(AddOutcome::Inserted);
            }
            self.split(index, page)?;
        }
    }

    /// Replaces the payload of an existing record in place.
    pub fn update(&mut self, record: Record) -> Result<()> {
        let (_, mut page) = self.load_for(record.key)?;
        page.replace(record)?;
        self.writer.write_page(&page)
    }

    /// Tombstones `key` and returns the record it held.
    pub fn remove(&mut self, key: i32) -> Result<Record> {
        let (_, mut page) = self.load_for(key)?;
        let removed = page.remove(key)?;
        self.writer.write_page(&page)?;
        Ok(removed)
    }

    /// Returns flat record slot `index` (`page * page_size + slot`) as stored.
    ///
    /// Served through the reader's page cache; tombstones and empty slots
    /// come back unfiltered. `None` past the end of the file.
    pub fn get_record(&mut self, index: u64) -> Result<Option<Record>> {
        self.reader.get_record(index)
    }

    /// Snapshot of the directory.
    pub fn dump_directory(&self) -> DirectoryDump {
        DirectoryDump {
            global_depth: self.global_depth,
            entries: self.entries.clone(),
        }
    }

    /// Snapshot of every page in file order. Not counted as I/O.
    pub fn dump_file(&mut self) -> Result<FileDump> {
        let hasher = self.hasher.clone();
        let pages = self
            .scan_pages()?
            .into_iter()
            .map(|page| PageDump::from_page(&page, hasher.as_ref()))
            .collect();
        Ok(FileDump { pages })
    }

    /// Every live record, in file order. Not counted as I/O.
    pub fn records(&mut self) -> Result<Vec<Record>> {
        Ok(self
            .scan_pages()?
            .iter()
            .flat_map(|page| page.live().iter().copied())
            .collect())
    }

    /// Checks that every slot resolves to a page whose records belong to it.
    pub fn verify(&mut self) -> Result<VerifyReport> {
        let mut report = VerifyReport::default();
        let pages = self.scan_pages()?;
        for entry in &self.entries {
            report.entries_checked += 1;
            let Some(number) = entry.page else {
                report.issues.push(format!("slot {} unassigned", entry.index));
                continue;
            };
            let Some(page) = pages.get(number as usize) else {
                report.issues.push(format!(
                    "slot {} points past the file at page {number}",
                    entry.index
                ));
                continue;
            };
            if page.depth() > self.global_depth {
                report.issues.push(format!(
                    "page {number} depth {} exceeds global depth {}",
                    page.depth(),
                    self.global_depth
                ));
                continue;
            }
            let expected = prefix(entry.index, page.depth());
            for record in page.live() {
                report.records_checked += 1;
                let actual = self.hasher.bucket_index(record.key, page.depth());
                if actual != expected {
                    report.issues.push(format!(
                        "key {} on page {number} hashes to bucket {actual}, slot {} expects {expected}",
                        record.key, entry.index
                    ));
                }
            }
        }
        Ok(report)
    }

    /// Syncs and releases the file.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.file.sync()?;
        info!(path = %self.file.path().display(), "directory.close");
        Ok(())
    }

    fn load_for(&mut self, key: i32) -> Result<(usize, Page)> {
        let index = self.bucket_of(key);
        let number = if self.global_depth == 0 {
            0
        } else {
            self.entries[index]
                .page
                .ok_or(StoreError::NoPageFound { index })?
        };
        let page = self
            .reader
            .read_page(number)?
            .ok_or(StoreError::NoPageFound { index })?;
        Ok((index, page))
    }

    /// Splits the full `page` reached through directory slot `index`.
    fn split(&mut self, index: usize, page: Page) -> Result<()> {
        let depth = page.depth();
        let grow = self.global_depth <= depth;
        let mut entries = if grow {
            if self.global_depth >= MAX_GLOBAL_DEPTH {
                return Err(StoreError::DirectoryFull {
                    depth: self.global_depth,
                });
            }
            self.grown_entries()?
        } else {
            self.entries.clone()
        };

        let mut first = Page::new(page.number(), depth + 1, self.page_size());
        let sibling = self.writer.append_empty_page()?;
        let mut second = Page::new(sibling, depth + 1, self.page_size());
        for record in page.live() {
            let target = if (self.hasher.hash(record.key) >> depth) & 1 == 0 {
                &mut first
            } else {
                &mut second
            };
            let placed = target.add(*record);
            debug_assert!(placed, "split half cannot overflow");
        }

        if grow {
            self.global_depth += 1;
            info!(global_depth = self.global_depth, "directory.grow");
        }

        let local = prefix(index, depth);
        for entry in entries.iter_mut().filter(|e| prefix(e.index, depth) == local) {
            entry.page = Some(if (entry.index >> depth) & 1 == 0 {
                first.number()
            } else {
                second.number()
            });
        }

        if first.is_empty() || second.is_empty() {
            warn!(
                page = page.number(),
                depth = depth + 1,
                "split left one half empty"
            );
        }
        self.writer.write_page(&first)?;
        self.writer.write_page(&second)?;
        self.entries = entries;
        debug!(
            page = first.number(),
            sibling = second.number(),
            depth = depth + 1,
            first_count = first.count(),
            second_count = second.count(),
            "directory.split"
        );
        Ok(())
    }

    /// Builds the doubled directory by rescanning every page on disk.
    ///
    /// Slots no live page claims (those served by empty pages) keep the
    /// page they mapped to before doubling.
    fn grown_entries(&mut self) -> Result<Vec<DirEntry>> {
        let len = 1usize << (self.global_depth + 1);
        let mut entries: Vec<DirEntry> = (0..len).map(DirEntry::vacant).collect();
        for page in self.scan_pages()? {
            if let Some(key) = page.first_key() {
                let local = self.hasher.bucket_index(key, page.depth());
                scatter(&mut entries, page.depth(), local, page.number());
            }
        }
        let old_len = self.entries.len();
        for entry in entries.iter_mut().filter(|e| e.page.is_none()) {
            entry.page = self.entries[entry.index & (old_len - 1)].page;
        }
        Ok(entries)
    }

    /// Reconstructs the directory of an existing file.
    ///
    /// Global depth is the deepest page. Slots left vacant by the live pages
    /// are bound one-to-one to empty pages (deepened to the global depth) or
    /// to freshly appended ones.
    fn rebuild(&mut self) -> Result<()> {
        let block = self.file.block_size() as u64;
        let len = self.file.len()?;
        if len % block != 0 {
            return Err(StoreError::PageRead {
                page: len / block,
                reason: format!(
                    "file ends with a partial block ({} stray bytes)",
                    len % block
                ),
            });
        }

        let pages = self.scan_pages()?;
        let global_depth = pages.iter().map(Page::depth).max().unwrap_or(0);
        if global_depth > MAX_GLOBAL_DEPTH {
            return Err(StoreError::DirectoryFull {
                depth: global_depth,
            });
        }
        let mut entries: Vec<DirEntry> =
            (0..1usize << global_depth).map(DirEntry::vacant).collect();
        let mut spare = Vec::new();
        for page in pages {
            match page.first_key() {
                Some(key) => {
                    let local = self.hasher.bucket_index(key, page.depth());
                    scatter(&mut entries, page.depth(), local, page.number());
                }
                None => spare.push(page),
            }
        }

        self.writer.set_counting(false);
        let bound = self.bind_vacant(&mut entries, spare, global_depth);
        self.writer.set_counting(self.count_io);
        bound?;

        self.global_depth = global_depth;
        self.entries = entries;
        debug!(global_depth, "directory.rebuild");
        Ok(())
    }

    fn bind_vacant(
        &mut self,
        entries: &mut [DirEntry],
        spare: Vec<Page>,
        depth: u32,
    ) -> Result<()> {
        let mut spare = spare.into_iter();
        for entry in entries.iter_mut().filter(|e| e.page.is_none()) {
            let mut page = match spare.next() {
                Some(page) => page,
                None => {
                    let number = self.writer.append_empty_page()?;
                    Page::new(number, 0, self.page_size())
                }
            };
            page.set_depth(depth);
            self.writer.write_page(&page)?;
            entry.page = Some(page.number());
        }
        Ok(())
    }

    fn scan_pages(&mut self) -> Result<Vec<Page>> {
        self.scanner.rewind();
        let mut pages = Vec::new();
        while let Some(page) = self.scanner.read_next()? {
            pages.push(page);
        }
        Ok(pages)
    }
}

impl Drop for Directory {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.file.sync() {
                warn!(error = %err, "directory.drop sync failed");
            }
        }
    }
}
