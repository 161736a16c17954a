//! Progress observers for downloads and extraction.
//!
//! Callbacks are side-effect hooks only: nothing in the pipeline reads them
//! back, so an observer can never influence control flow or outcome.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Byte-level progress callback for a download.
///
/// # Arguments
///
/// * `bytes_on_disk` - Cumulative bytes written to the destination,
///   including bytes already present before a resumed attempt
/// * `total_bytes` - Expected final size, or 0 when the server did not
///   report one (count-only mode)
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Entry-level progress callback for extraction.
///
/// Invoked with (entries processed, entries discovered so far). Shared
/// across concurrent nested-extraction workers, hence `Arc`.
pub type ExtractProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Shared counters for extraction progress.
///
/// Nested archives are extracted by concurrent workers; these atomics are
/// the only state they share besides the collected-error list.
#[derive(Debug, Default)]
pub struct ExtractCounters {
    /// Entries extracted so far, across all nesting levels.
    entries_done: AtomicUsize,
    /// Entries discovered so far. Grows as nested archives are opened.
    entries_total: AtomicUsize,
    /// Nested archives scheduled for recursive extraction.
    nested_seen: AtomicUsize,
}

impl ExtractCounters {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that an archive with `count` entries was opened.
    pub fn add_discovered(&self, count: usize) {
        self.entries_total.fetch_add(count, Ordering::SeqCst);
    }

    /// Record one extracted entry.
    pub fn mark_done(&self) {
        self.entries_done.fetch_add(1, Ordering::SeqCst);
    }

    /// Record one nested archive scheduled for extraction.
    pub fn mark_nested(&self) {
        self.nested_seen.fetch_add(1, Ordering::SeqCst);
    }

    /// Entries extracted so far.
    pub fn done(&self) -> usize {
        self.entries_done.load(Ordering::SeqCst)
    }

    /// Entries discovered so far.
    pub fn total(&self) -> usize {
        self.entries_total.load(Ordering::SeqCst)
    }

    /// Nested archives seen so far.
    pub fn nested(&self) -> usize {
        self.nested_seen.load(Ordering::SeqCst)
    }
}
