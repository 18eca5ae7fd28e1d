//! Sync run accounting
//!
//! [`RunCounters`] accumulates per-object outcomes while a run is in flight
//! and is shared by the concurrent download tasks of a page. When the run
//! finishes the counters are frozen into a serializable [`RunResult`].

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// RunCounters
// ============================================================================

/// Lock-free tallies for a single sync run
///
/// A fresh value is created at the start of every run. `successfully_synced`
/// is incremented for objects that were already current (`skipped`) and for
/// objects downloaded in this run.
#[derive(Debug, Default)]
pub struct RunCounters {
    total_seen: AtomicU64,
    successfully_synced: AtomicU64,
    skipped: AtomicU64,
    downloaded: AtomicU64,
    failed: AtomicU64,
    gone: AtomicU64,
    pages: AtomicU64,
}

impl RunCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for a listing page of `items` objects
    pub fn record_page(&self, items: usize) {
        self.pages.fetch_add(1, Ordering::Relaxed);
        self.total_seen.fetch_add(items as u64, Ordering::Relaxed);
    }

    /// Object was already current locally
    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.successfully_synced.fetch_add(1, Ordering::Relaxed);
    }

    /// Object was fetched and written
    pub fn record_downloaded(&self) {
        self.downloaded.fetch_add(1, Ordering::Relaxed);
        self.successfully_synced.fetch_add(1, Ordering::Relaxed);
    }

    /// Object could not be brought up to date
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Object disappeared between listing and download
    pub fn record_gone(&self) {
        self.gone.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn total_seen(&self) -> u64 {
        self.total_seen.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn successfully_synced(&self) -> u64 {
        self.successfully_synced.load(Ordering::Relaxed)
    }

    /// Freeze the counters into a result
    #[must_use]
    pub fn finish(&self, run_id: Uuid, aborted: Option<String>, duration_ms: u64) -> RunResult {
        RunResult {
            run_id,
            rejected: false,
            total_seen: self.total_seen(),
            successfully_synced: self.successfully_synced(),
            skipped: self.skipped.load(Ordering::Relaxed),
            downloaded: self.downloaded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            gone: self.gone.load(Ordering::Relaxed),
            pages: self.pages.load(Ordering::Relaxed),
            aborted,
            duration_ms,
        }
    }
}

// ============================================================================
// RunResult
// ============================================================================

/// Summary of one sync trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Identifier used in logs for this run
    pub run_id: Uuid,
    /// Another run was active; nothing was done
    pub rejected: bool,
    /// Objects reported by all listing pages visited
    pub total_seen: u64,
    /// Objects whose local copy is current after the run
    pub successfully_synced: u64,
    /// Objects already current (no download needed)
    pub skipped: u64,
    /// Objects downloaded in this run
    pub downloaded: u64,
    /// Objects that could not be synced
    pub failed: u64,
    /// Objects deleted remotely while the run was in progress
    pub gone: u64,
    /// Listing pages visited
    pub pages: u64,
    /// Reason pagination ended early, if it did
    pub aborted: Option<String>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl RunResult {
    /// Outcome of a trigger that found another run in progress
    #[must_use]
    pub fn rejected() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            rejected: true,
            total_seen: 0,
            successfully_synced: 0,
            skipped: 0,
            downloaded: 0,
            failed: 0,
            gone: 0,
            pages: 0,
            aborted: None,
            duration_ms: 0,
        }
    }

    /// Returns true if listing ended early
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    /// Returns true if every object seen is current locally
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.successfully_synced == self.total_seen
    }
}
