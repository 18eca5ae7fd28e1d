//! Single-flight run guard
//!
//! At most one sync run may be active per guard. A trigger that finds the
//! guard taken is turned away immediately; nothing waits and nothing is
//! queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Idle/running flag shared by everything that may start a run
#[derive(Debug, Default)]
pub struct SyncRunGuard {
    running: AtomicBool,
}

impl SyncRunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts the idle to running transition
    ///
    /// Returns `None` if a run is already active. The returned permit puts
    /// the guard back to idle when dropped, on every exit path.
    pub fn try_acquire(self: &Arc<Self>) -> Option<RunPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                guard: Arc::clone(self),
            })
    }

    /// Returns true while a permit is outstanding
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Proof that the holder owns the current run
#[derive(Debug)]
pub struct RunPermit {
    guard: Arc<SyncRunGuard>,
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}
