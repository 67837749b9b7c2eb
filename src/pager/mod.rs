//! Page-granular access to the backing file.
//!
//! A [`PageFile`] owns the shared handle; [`PageReader`] and [`PageWriter`]
//! are cheap views over it that translate [`Page`]s to and from fixed-size
//! blocks. Every block `n` lives at `n * block_size(page_size)`.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use tracing::{debug, trace};

use crate::primitives::io::{FileIo, StdFileIo};
use crate::storage::metrics::IoMetrics;
use crate::storage::options::{StoreOptions, Synchronous};
use crate::types::{Record, Result, StoreError};

pub mod page;

pub use page::{block_size, page_number_at, page_offset, Page, PAGE_HEADER_SIZE};

/// Page number as stored in the directory.
pub type PageNo = u64;

/// The backing file shared by every reader and writer of one store.
#[derive(Clone)]
pub struct PageFile {
    io: Arc<dyn FileIo>,
    path: PathBuf,
    page_size: usize,
    synchronous: Synchronous,
    // Bumped on every write so readers can drop cached pages.
    epoch: Arc<AtomicU64>,
}

impl PageFile {
    /// Opens or creates the file at `path`, truncating it when configured.
    pub fn open(path: impl AsRef<Path>, options: &StoreOptions) -> Result<Self> {
        options.validate()?;
        let path = path.as_ref().to_path_buf();
        let io = StdFileIo::open(&path)?;
        if options.truncate {
            io.truncate(0)?;
        }
        debug!(path = %path.display(), page_size = options.page_size, "pager.open");
        Ok(Self::with_io(
            Arc::new(io),
            path,
            options.page_size,
            options.synchronous,
        ))
    }

    /// Wraps an existing I/O backend.
    pub fn with_io(
        io: Arc<dyn FileIo>,
        path: PathBuf,
        page_size: usize,
        synchronous: Synchronous,
    ) -> Self {
        Self {
            io,
            path,
            page_size,
            synchronous,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Bytes per page block.
    pub fn block_size(&self) -> usize {
        block_size(self.page_size)
    }

    /// Current file length in bytes.
    pub fn len(&self) -> Result<u64> {
        self.io.len()
    }

    /// True when the file holds no bytes.
    pub fn is_empty(&self) -> Result<bool> {
        self.io.is_empty()
    }

    /// Number of complete page blocks in the file.
    pub fn page_count(&self) -> Result<u64> {
        Ok(page_number_at(self.io.len()?, self.page_size))
    }

    /// Flushes file contents to disk.
    pub fn sync(&self) -> Result<()> {
        self.io.sync_all()
    }

    /// Creates a reader; `counting` controls whether reads reach `metrics`.
    pub fn reader(
        &self,
        metrics: Arc<dyn IoMetrics>,
        counting: bool,
        cache_pages: usize,
    ) -> PageReader {
        let capacity = NonZeroUsize::new(cache_pages).unwrap_or(NonZeroUsize::MIN);
        PageReader {
            file: self.clone(),
            cursor: 0,
            metrics,
            counting,
            cache: LruCache::new(capacity),
            cache_epoch: self.epoch(),
        }
    }

    /// Creates a writer; `counting` controls whether writes reach `metrics`.
    pub fn writer(&self, metrics: Arc<dyn IoMetrics>, counting: bool) -> PageWriter {
        PageWriter {
            file: self.clone(),
            metrics,
            counting,
        }
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Reads the block at `offset`; `None` when the file ends before it.
    fn read_block(&self, number: PageNo, offset: u64) -> Result<Option<Page>> {
        let mut buf = vec![0u8; self.block_size()];
        let read = self.io.read_at(offset, &mut buf)?;
        if read == 0 {
            return Ok(None);
        }
        if read < buf.len() {
            return Err(StoreError::PageRead {
                page: number,
                reason: format!("short read: {read} of {} bytes", buf.len()),
            });
        }
        Page::decode(number, &buf, self.page_size).map(Some)
    }
}

/// Reads page blocks by number or sequentially.
pub struct PageReader {
    file: PageFile,
    cursor: u64,
    metrics: Arc<dyn IoMetrics>,
    counting: bool,
    cache: LruCache<PageNo, Page>,
    cache_epoch: u64,
}

impl PageReader {
    /// Reads page `number`.
    ///
    /// Returns `Ok(None)` when the page lies past the end of the file and
    /// [`StoreError::PageRead`] when its block is only partially present or
    /// fails to decode. The sequential cursor moves past the block.
    pub fn read_page(&mut self, number: PageNo) -> Result<Option<Page>> {
        let offset = page_offset(number, self.file.page_size)?;
        let page = self.file.read_block(number, offset)?;
        if page.is_some() {
            self.cursor = offset + self.file.block_size() as u64;
            self.count_read();
            trace!(page = number, "pager.read_page");
        }
        Ok(page)
    }

    /// Reads the block under the cursor and advances it.
    pub fn read_next(&mut self) -> Result<Option<Page>> {
        let number = page_number_at(self.cursor, self.file.page_size);
        let page = self.file.read_block(number, self.cursor)?;
        if page.is_some() {
            self.cursor += self.file.block_size() as u64;
            self.count_read();
        }
        Ok(page)
    }

    /// Moves the sequential cursor back to the first page.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Returns slot `index % page_size` of page `index / page_size`.
    ///
    /// The slot is returned as stored, so it may be empty or stale. Pages
    /// are served from the reader cache until the file is next written.
    pub fn get_record(&mut self, index: u64) -> Result<Option<Record>> {
        let page_size = self.file.page_size as u64;
        let number = index / page_size;
        let slot = (index % page_size) as usize;

        let epoch = self.file.epoch();
        if epoch != self.cache_epoch {
            self.cache.clear();
            self.cache_epoch = epoch;
        }
        if let Some(page) = self.cache.get(&number) {
            return Ok(page.slots().nth(slot).copied());
        }
        let Some(page) = self.read_page(number)? else {
            return Ok(None);
        };
        let record = page.slots().nth(slot).copied();
        self.cache.put(number, page);
        Ok(record)
    }

    fn count_read(&self) {
        if self.counting {
            self.metrics.page_read();
        }
    }
}

/// Writes page blocks in place and allocates new ones at the end of file.
pub struct PageWriter {
    file: PageFile,
    metrics: Arc<dyn IoMetrics>,
    counting: bool,
}

impl PageWriter {
    /// Writes `page` at the offset given by its number.
    ///
    /// The block is visible to every reader once this returns; with
    /// [`Synchronous::Full`] it has also been synced to disk.
    pub fn write_page(&mut self, page: &Page) -> Result<()> {
        if page.capacity() != self.file.page_size {
            return Err(StoreError::InvalidArgument(format!(
                "page {} holds {} slots, file pages hold {}",
                page.number(),
                page.capacity(),
                self.file.page_size
            )));
        }
        let offset = page_offset(page.number(), self.file.page_size)?;
        let buf = page.encode()?;
        self.write_block(offset, &buf)?;
        trace!(
            page = page.number(),
            depth = page.depth(),
            count = page.count(),
            "pager.write_page"
        );
        Ok(())
    }

    /// Appends an empty depth-0 page and returns its number.
    pub fn append_empty_page(&mut self) -> Result<PageNo> {
        let len = self.file.len()?;
        let block = self.file.block_size() as u64;
        let number = page_number_at(len, self.file.page_size);
        if len % block != 0 {
            return Err(StoreError::PageRead {
                page: number,
                reason: format!(
                    "file ends with a partial block ({} stray bytes)",
                    len % block
                ),
            });
        }
        let page = Page::new(number, 0, self.file.page_size);
        self.write_block(len, &page.encode()?)?;
        debug!(page = number, "pager.append_empty_page");
        Ok(number)
    }

    /// Turns metric reporting on or off.
    pub fn set_counting(&mut self, counting: bool) {
        self.counting = counting;
    }

    fn write_block(&mut self, offset: u64, buf: &[u8]) -> Result<()> {
        self.file.io.write_at(offset, buf)?;
        if self.file.synchronous == Synchronous::Full {
            self.file.io.sync_all()?;
        }
        self.file.bump_epoch();
        if self.counting {
            self.metrics.page_written();
        }
        Ok(())
    }
}
