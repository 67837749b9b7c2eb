//! The extendible-hash store and its supporting configuration.
//!
//! [`Directory`] is the entry point: it owns the page file, resolves keys
//! to pages through the in-memory directory and splits pages on overflow.

pub mod directory;
pub mod dump;
pub mod metrics;
pub mod options;

pub use directory::{AddOutcome, DirEntry, Directory, VerifyReport, MAX_GLOBAL_DEPTH};
pub use dump::{DirectoryDump, FileDump, PageDump, RecordDump};
pub use metrics::{default_metrics, CounterMetrics, IoMetrics, IoStats, NoopMetrics};
pub use options::{StoreOptions, Synchronous, DEFAULT_PAGE_SIZE};
