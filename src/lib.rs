//! Disk-backed key/value store indexed by extendible hashing.
//!
//! Records are fixed 16-byte tuples of four `i32`s, the first being the key.
//! They live in fixed-capacity pages inside a single file; an in-memory
//! [`Directory`] maps the low bits of each key's hash to the page that owns
//! it, splitting pages and doubling itself as the data grows.
//!
//! ```no_run
//! use exhash::{Directory, Record};
//!
//! # fn main() -> exhash::Result<()> {
//! let mut dir = Directory::create("store.db", 4)?;
//! dir.add(Record::new(1, 10, 20, 30))?;
//! assert_eq!(dir.get(1)?.a, 10);
//! dir.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod logging;
pub mod pager;
pub mod primitives;
pub mod storage;
pub mod types;

pub use pager::{Page, PageNo};
pub use primitives::hash::{HashKind, KeyHash};
pub use storage::{
    AddOutcome, CounterMetrics, DirEntry, Directory, IoMetrics, IoStats, NoopMetrics,
    StoreOptions, Synchronous, VerifyReport,
};
pub use types::{Record, Result, StoreError};
