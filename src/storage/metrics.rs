//! Page I/O counters reported to the host.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Observer notified by the page reader and writer for every block moved.
///
/// The host owns the implementation and reads it back for reporting; the
/// engine only ever calls into it.
pub trait IoMetrics: Send + Sync {
    /// Records one page block read from the file.
    fn page_read(&self);

    /// Records one page block written to the file.
    fn page_written(&self);

    /// Returns the totals observed so far.
    fn snapshot(&self) -> IoStats {
        IoStats::default()
    }
}

/// Point-in-time read/write totals.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IoStats {
    /// Page blocks read.
    pub reads: u64,
    /// Page blocks written.
    pub writes: u64,
}

impl fmt::Display for IoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R: {}, W: {}", self.reads, self.writes)
    }
}

/// A no-op implementation of [`IoMetrics`].
#[derive(Default)]
pub struct NoopMetrics;

impl IoMetrics for NoopMetrics {
    fn page_read(&self) {}
    fn page_written(&self) {}
}

/// Atomic counter implementation of [`IoMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Number of page reads.
    pub reads: AtomicU64,

    /// Number of page writes.
    pub writes: AtomicU64,
}

impl CounterMetrics {
    /// Zeroes both counters.
    pub fn reset(&self) {
        self.reads.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
    }
}

impl IoMetrics for CounterMetrics {
    fn page_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    fn page_written(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> IoStats {
        IoStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}

/// Returns a fresh counter-backed metrics sink.
pub fn default_metrics() -> Arc<dyn IoMetrics> {
    Arc::new(CounterMetrics::default())
}
