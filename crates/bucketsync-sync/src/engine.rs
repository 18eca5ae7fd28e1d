//! Sync run orchestration
//!
//! The [`SyncEngine`] mirrors the bucket into the local sync root, one
//! trigger at a time.
//!
//! ## Run Flow
//!
//! 1. **Guard**: take the single-flight permit, or return a rejected result
//! 2. **Paginate**: walk the listing; for every object evaluate the local
//!    copy and download it unless it is already present
//! 3. **Finalize**: release the permit, summarize, notify when some objects
//!    were left unsynced
//!
//! Only listing failures end a run early. Everything that goes wrong with
//! a single object is logged, counted and skipped.

use std::sync::Arc;
use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use bucketsync_core::config::{SyncConfig, MAX_DOWNLOAD_CONCURRENCY, MAX_PAGE_LIMIT};
use bucketsync_core::domain::{RemoteObjectMetadata, RunCounters, RunResult, SyncPath};
use bucketsync_core::ports::{ILocalFileSystem, IRemoteStorage};

use crate::cursor::{ListingCursor, ListingOptions};
use crate::download::{DownloadExecutor, DownloadOutcome};
use crate::freshness::FreshnessEvaluator;
use crate::guard::SyncRunGuard;
use crate::notifier::Notifier;
use crate::SyncError;

/// What happened to one listed object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObjectOutcome {
    /// Local copy was already current
    Skipped,
    Downloaded,
    Failed,
    /// Deleted remotely during the run
    Gone,
}

/// Mirrors a remote bucket into a local directory
pub struct SyncEngine {
    remote: Arc<dyn IRemoteStorage + Send + Sync>,
    evaluator: FreshnessEvaluator,
    executor: DownloadExecutor,
    notifier: Notifier,
    guard: Arc<SyncRunGuard>,
    options: ListingOptions,
    download_concurrency: usize,
}

impl SyncEngine {
    /// Creates an engine mirroring into `config.root`
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfiguration`] if the page limit or the
    /// download concurrency is out of range, or the root is not absolute.
    pub fn new(
        remote: Arc<dyn IRemoteStorage + Send + Sync>,
        filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
        notifier: Notifier,
        config: &SyncConfig,
    ) -> Result<Self, SyncError> {
        if config.page_limit == 0 || config.page_limit > MAX_PAGE_LIMIT {
            return Err(SyncError::InvalidConfiguration(format!(
                "page limit must be between 1 and {MAX_PAGE_LIMIT}, got {}",
                config.page_limit
            )));
        }
        if config.download_concurrency == 0 || config.download_concurrency > MAX_DOWNLOAD_CONCURRENCY
        {
            return Err(SyncError::InvalidConfiguration(format!(
                "download concurrency must be between 1 and {MAX_DOWNLOAD_CONCURRENCY}, got {}",
                config.download_concurrency
            )));
        }
        let root = SyncPath::new(config.resolved_root()).map_err(|e| {
            SyncError::InvalidConfiguration(format!("sync root: {e}"))
        })?;

        Ok(Self {
            remote: remote.clone(),
            evaluator: FreshnessEvaluator::new(filesystem.clone(), root),
            executor: DownloadExecutor::new(remote, filesystem),
            notifier,
            guard: Arc::new(SyncRunGuard::new()),
            options: ListingOptions {
                prefix: config.prefix.clone(),
                page_limit: config.page_limit,
                delimiter: config.delimiter.clone(),
            },
            download_concurrency: config.download_concurrency,
        })
    }

    /// Shares `guard` with other engines so that only one of them runs at a time
    #[must_use]
    pub fn with_guard(mut self, guard: Arc<SyncRunGuard>) -> Self {
        self.guard = guard;
        self
    }

    /// The guard this engine runs under
    pub fn guard(&self) -> &Arc<SyncRunGuard> {
        &self.guard
    }

    /// The directory the bucket is mirrored into
    pub fn root(&self) -> &SyncPath {
        self.evaluator.root()
    }

    /// Runs one sync pass
    ///
    /// Returns [`RunResult::rejected`] without doing anything if another
    /// run holds the guard.
    pub async fn trigger_sync(&self) -> RunResult {
        let Some(permit) = self.guard.try_acquire() else {
            warn!("Sync already in progress, trigger rejected");
            return RunResult::rejected();
        };

        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%run_id, root = %self.root(), prefix = %self.options.prefix, "Starting sync run");

        let counters = RunCounters::new();
        let mut cursor = ListingCursor::new(self.remote.clone(), self.options.clone());
        let mut aborted = None;

        loop {
            match cursor.next_page().await {
                Ok(Some(page)) => {
                    counters.record_page(page.len());
                    debug!(%run_id, items = page.len(), "Processing listing page");
                    self.process_page(page.items, &counters).await;
                }
                Ok(None) => break,
                Err(e) => {
                    error!(%run_id, error = %e, pages = cursor.pages_fetched(), "Listing failed, ending run early");
                    aborted = Some(e.to_string());
                    break;
                }
            }
        }

        drop(permit);

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let result = counters.finish(run_id, aborted, duration_ms);

        info!(
            %run_id,
            total = result.total_seen,
            synced = result.successfully_synced,
            downloaded = result.downloaded,
            skipped = result.skipped,
            failed = result.failed,
            gone = result.gone,
            duration_ms,
            "Bucket holds {} objects, {} synced",
            result.total_seen,
            result.successfully_synced
        );

        self.notifier
            .notify(result.total_seen, result.successfully_synced)
            .await;

        result
    }

    /// Syncs the objects of one page, in listing order
    async fn process_page(&self, items: Vec<RemoteObjectMetadata>, counters: &RunCounters) {
        stream::iter(items)
            .map(|meta| self.sync_object(meta))
            .buffered(self.download_concurrency)
            .for_each(|outcome| {
                match outcome {
                    ObjectOutcome::Skipped => counters.record_skipped(),
                    ObjectOutcome::Downloaded => counters.record_downloaded(),
                    ObjectOutcome::Failed => counters.record_failed(),
                    ObjectOutcome::Gone => counters.record_gone(),
                }
                futures_util::future::ready(())
            })
            .await;
    }

    async fn sync_object(&self, meta: RemoteObjectMetadata) -> ObjectOutcome {
        let evaluation = match self.evaluator.evaluate(&meta).await {
            Ok(evaluation) => evaluation,
            Err(e) => {
                warn!(key = %meta.key, error = %e, "Object cannot be mirrored locally");
                return ObjectOutcome::Failed;
            }
        };

        if !evaluation.verdict.needs_download() {
            return ObjectOutcome::Skipped;
        }

        debug!(key = %meta.key, verdict = %evaluation.verdict, "Downloading object");
        match self.executor.fetch(&meta, &evaluation.path).await {
            DownloadOutcome::Downloaded => ObjectOutcome::Downloaded,
            DownloadOutcome::Gone => {
                info!(key = %meta.key, "Object was deleted remotely during the run");
                ObjectOutcome::Gone
            }
            DownloadOutcome::UrlUnavailable | DownloadOutcome::TransferFailed => {
                ObjectOutcome::Failed
            }
        }
    }
}
