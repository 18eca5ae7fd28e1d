//! Local copy evaluation
//!
//! Decides, for one listed object, whether the local mirror already holds a
//! current copy. The decision is made from the filesystem on every run and
//! never cached.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use bucketsync_core::domain::{DomainError, FreshnessVerdict, RemoteObjectMetadata, SyncPath};
use bucketsync_core::ports::{FileSystemState, ILocalFileSystem};

/// Verdict for one object together with the local path it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub path: SyncPath,
    pub verdict: FreshnessVerdict,
}

/// Compares listed objects with their copies below the sync root
pub struct FreshnessEvaluator {
    filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    root: SyncPath,
}

impl FreshnessEvaluator {
    pub fn new(filesystem: Arc<dyn ILocalFileSystem + Send + Sync>, root: SyncPath) -> Self {
        Self { filesystem, root }
    }

    /// The directory objects are mirrored into
    pub fn root(&self) -> &SyncPath {
        &self.root
    }

    /// Classifies the local copy of `meta`
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the object key cannot be mapped to a
    /// path below the sync root.
    pub async fn evaluate(&self, meta: &RemoteObjectMetadata) -> Result<Evaluation, DomainError> {
        let path = self.root.join_key(&meta.key)?;

        let state = match self.filesystem.get_state(&path).await {
            Ok(state) => state,
            Err(e) => {
                warn!(key = %meta.key, path = %path, error = %e, "Cannot inspect local copy, treating as missing");
                FileSystemState::not_found()
            }
        };

        let verdict = classify(&state, meta.modified_at);
        debug!(key = %meta.key, %verdict, "Evaluated local copy");
        Ok(Evaluation { path, verdict })
    }
}

fn classify(state: &FileSystemState, remote_modified: DateTime<Utc>) -> FreshnessVerdict {
    if !state.is_regular_file() {
        return FreshnessVerdict::Missing;
    }
    if state.size == 0 {
        return FreshnessVerdict::Empty;
    }
    match state.modified {
        // Filesystems differ in sub-millisecond precision; compare at ms.
        Some(local) if local.timestamp_millis() >= remote_modified.timestamp_millis() => {
            FreshnessVerdict::Present
        }
        _ => FreshnessVerdict::Stale,
    }
}
