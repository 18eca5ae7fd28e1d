//! Periodic sync trigger
//!
//! The [`SyncScheduler`] fires [`SyncEngine::trigger_sync`] on a fixed
//! interval until its cancellation token fires.
//!
//! ## Flow
//!
//! ```text
//! interval tick ──→ trigger_sync ──→ RunResult (logged)
//!       │                 │
//!  CancellationToken ─────┘ (aborts the wait and any run in progress)
//! ```
//!
//! Ticks missed while a run was in progress are skipped, not replayed. A
//! tick that finds another trigger holding the guard is rejected by the
//! engine and simply dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::SyncEngine;

/// Counts of what the scheduler did before it stopped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Runs that completed (possibly aborted by a listing failure)
    pub runs: u64,
    /// Ticks turned away because another run was active
    pub rejected: u64,
}

/// Runs the engine on a fixed interval
pub struct SyncScheduler {
    engine: Arc<SyncEngine>,
    interval: Duration,
}

impl SyncScheduler {
    pub fn new(engine: Arc<SyncEngine>, interval: Duration) -> Self {
        info!(interval_secs = interval.as_secs(), "Creating sync scheduler");
        Self { engine, interval }
    }

    /// Main loop; the first run starts immediately
    ///
    /// Returns once `shutdown` is cancelled. A run in progress at that point
    /// is dropped, which releases its guard.
    pub async fn run(self, shutdown: CancellationToken) -> SchedulerStats {
        info!("Sync scheduler starting");

        let mut stats = SchedulerStats::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }

            debug!("Scheduled sync tick");
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    warn!("Shutdown requested during a scheduled run");
                    break;
                }
                result = self.engine.trigger_sync() => {
                    if result.rejected {
                        stats.rejected += 1;
                    } else {
                        stats.runs += 1;
                    }
                }
            }
        }

        info!(runs = stats.runs, rejected = stats.rejected, "Sync scheduler stopped");
        stats
    }
}
