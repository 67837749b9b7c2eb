//! Store configuration and TOML loading.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::primitives::hash::HashKind;
use crate::pager::page::PAGE_HEADER_SIZE;
use crate::types::{Result, StoreError, RECORD_SIZE};

/// Records per page when no size is configured.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Pages kept by the reader's flat-record cache by default.
pub const DEFAULT_CACHE_PAGES: usize = 1;

/// Durability applied after each page write.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Synchronous {
    /// `fsync` after every page write.
    Full,
    /// Rely on positional writes being visible to later reads.
    #[default]
    Normal,
}

impl Synchronous {
    /// Returns the string representation of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Synchronous::Full => "full",
            Synchronous::Normal => "normal",
        }
    }
}

/// Configuration supplied when opening a store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreOptions {
    /// Records per page. Must match between every writer and reader of a file.
    pub page_size: usize,
    /// Hash strategy used to place keys.
    pub hash: HashKind,
    /// Sync behaviour after page writes.
    pub synchronous: Synchronous,
    /// Whether caller-visible operations feed the I/O counters.
    pub count_io: bool,
    /// Capacity of the reader's page cache used by flat record lookups.
    pub cache_pages: usize,
    /// Discard any existing file contents on open.
    pub truncate: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            hash: HashKind::default(),
            synchronous: Synchronous::default(),
            count_io: true,
            cache_pages: DEFAULT_CACHE_PAGES,
            truncate: true,
        }
    }
}

impl StoreOptions {
    /// Default options with every write synced to disk.
    pub fn durable() -> Self {
        Self {
            synchronous: Synchronous::Full,
            ..Self::default()
        }
    }

    /// Sets the number of records per page.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the hash strategy.
    pub fn hash(mut self, hash: HashKind) -> Self {
        self.hash = hash;
        self
    }

    /// Sets the sync mode.
    pub fn synchronous(mut self, synchronous: Synchronous) -> Self {
        self.synchronous = synchronous;
        self
    }

    /// Enables or disables I/O counting.
    pub fn count_io(mut self, count_io: bool) -> Self {
        self.count_io = count_io;
        self
    }

    /// Sets the reader cache capacity in pages.
    pub fn cache_pages(mut self, cache_pages: usize) -> Self {
        self.cache_pages = cache_pages;
        self
    }

    /// Chooses between starting fresh and reopening existing contents.
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    /// Checks option ranges.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(StoreError::InvalidArgument(
                "page size must hold at least one record".into(),
            ));
        }
        let bytes = self
            .page_size
            .checked_mul(RECORD_SIZE)
            .and_then(|bytes| bytes.checked_add(PAGE_HEADER_SIZE));
        match bytes {
            Some(bytes) if u32::try_from(bytes).is_ok() => {}
            _ => {
                return Err(StoreError::InvalidArgument(format!(
                    "page size {} produces an oversized block",
                    self.page_size
                )))
            }
        }
        if self.cache_pages == 0 {
            return Err(StoreError::InvalidArgument(
                "cache must hold at least one page".into(),
            ));
        }
        Ok(())
    }

    /// Parses options from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text).map_err(|err| StoreError::Config {
            path: None,
            message: err.to_string(),
        })?;
        options.validate()?;
        Ok(options)
    }

    /// Loads options from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text).map_err(|err| match err {
            StoreError::Config { message, .. } => StoreError::Config {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })
    }
}
