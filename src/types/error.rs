//! Error handling for store operations.
//!
//! All fallible APIs return [`Result<T>`]. Two variants,
//! [`StoreError::RecordNotFound`] and [`StoreError::NoPageFound`], are
//! ordinary negative outcomes that hosts report and move past; everything
//! else indicates a damaged file, a bad argument or a fatal I/O failure.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while operating on an extendible-hash store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key is absent from the page its hash resolves to.
    #[error("record with key {key} not found")]
    RecordNotFound {
        /// Key that was looked up.
        key: i32,
    },

    /// The directory slot for a key is unassigned or points past the file.
    #[error("no page found for directory index {index}")]
    NoPageFound {
        /// Directory index derived from the key hash.
        index: usize,
    },

    /// A page block exists but could not be read back intact.
    ///
    /// Distinct from [`StoreError::NoPageFound`] so that a truncated or
    /// corrupt file is never mistaken for a page that was simply never
    /// allocated.
    #[error("page {page} unreadable: {reason}")]
    PageRead {
        /// Page number whose block was damaged.
        page: u64,
        /// Description of the failure.
        reason: String,
    },

    /// A record could not be decoded from its source.
    #[error("record decode error: {0}")]
    Decode(String),

    /// Splitting would push the directory past the usable hash width.
    #[error("directory cannot grow beyond global depth {depth}")]
    DirectoryFull {
        /// Global depth at which growth was refused.
        depth: u32,
    },

    /// Invalid argument or option.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration file could not be loaded.
    #[error("config error in {path:?}: {message}")]
    Config {
        /// Path of the offending file, if any.
        path: Option<PathBuf>,
        /// Parser message.
        message: String,
    },

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Returns true for the recoverable "absent" outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::RecordNotFound { .. } | StoreError::NoPageFound { .. }
        )
    }
}
