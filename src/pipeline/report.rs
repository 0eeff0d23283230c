//! Run statistics and the end-of-run report.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Live counters for one pipeline run.
///
/// Uses atomic counters so the producer, the consumer, and the progress UI
/// can share them across tasks.
#[derive(Debug, Default)]
pub struct PipelineStats {
    discovered: AtomicUsize,
    skipped: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl PipelineStats {
    /// Creates a stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Valid items the producer put on the channel.
    #[must_use]
    pub fn discovered(&self) -> usize {
        self.discovered.load(Ordering::SeqCst)
    }

    /// Links dropped before the channel (invalid or unresolvable).
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Items fetched and written successfully.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Items whose fetch or write failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Items the consumer has finished with, either way.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.completed() + self.failed()
    }

    pub(crate) fn record_discovered(&self) {
        self.discovered.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

/// One item that could not be downloaded, with enough context to retry it
/// by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    /// The on-disk name the item would have been saved under.
    pub file_name: String,
    /// The asset URL.
    pub url: String,
    /// Rendered error message.
    pub error: String,
}

/// Aggregated outcome of a pipeline run.
#[derive(Debug)]
pub struct DownloadReport {
    stats: Arc<PipelineStats>,
    failures: Vec<DownloadFailure>,
}

impl DownloadReport {
    pub(crate) fn new(stats: Arc<PipelineStats>, failures: Vec<DownloadFailure>) -> Self {
        Self { stats, failures }
    }

    /// Valid items the producer discovered.
    #[must_use]
    pub fn discovered(&self) -> usize {
        self.stats.discovered()
    }

    /// Links skipped before download.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.stats.skipped()
    }

    /// Files written.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.stats.completed()
    }

    /// Items that failed to download.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.stats.failed()
    }

    /// Per-item failure details, in the order they happened.
    #[must_use]
    pub fn failures(&self) -> &[DownloadFailure] {
        &self.failures
    }

    /// True when every discovered item was downloaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
