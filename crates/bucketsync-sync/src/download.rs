//! Object download executor
//!
//! Fetches one object's content and installs it at its mirror path with the
//! remote modification time. Failures are scoped to the object: they are
//! logged and reported as a [`DownloadOutcome`], never raised.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use bucketsync_core::domain::{RemoteObjectMetadata, SyncPath};
use bucketsync_core::ports::{ILocalFileSystem, IRemoteStorage};

/// Result of one download attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Content written and timestamp applied
    Downloaded,
    /// No download URL could be obtained
    UrlUnavailable,
    /// The object no longer exists remotely
    Gone,
    /// Transfer, verification or local write failed
    TransferFailed,
}

impl DownloadOutcome {
    /// Returns true only if the local copy is now current
    pub fn is_success(self) -> bool {
        matches!(self, DownloadOutcome::Downloaded)
    }
}

/// Downloads objects into the local mirror
pub struct DownloadExecutor {
    remote: Arc<dyn IRemoteStorage + Send + Sync>,
    filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
}

impl DownloadExecutor {
    pub fn new(
        remote: Arc<dyn IRemoteStorage + Send + Sync>,
        filesystem: Arc<dyn ILocalFileSystem + Send + Sync>,
    ) -> Self {
        Self { remote, filesystem }
    }

    /// Downloads `meta` to `path`
    ///
    /// Nothing is written unless the fetched byte count matches the listed
    /// size. After a successful write the file's mtime is set to the
    /// object's `modified_at` so the next run classifies it as present.
    #[instrument(skip(self, meta), fields(key = %meta.key, size = meta.size))]
    pub async fn fetch(&self, meta: &RemoteObjectMetadata, path: &SyncPath) -> DownloadOutcome {
        let url = match self.remote.resolve_download_url(&meta.key).await {
            Ok(Some(url)) if !url.is_empty() => url,
            Ok(Some(_)) => {
                warn!("Download URL resolved to an empty string");
                return DownloadOutcome::UrlUnavailable;
            }
            Ok(None) => {
                debug!("Object disappeared before its link was resolved");
                return DownloadOutcome::Gone;
            }
            Err(e) => {
                warn!(error = %e, "Failed to resolve download URL");
                return DownloadOutcome::UrlUnavailable;
            }
        };

        let data = match self.remote.fetch(&url).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                debug!("Object disappeared before it was fetched");
                return DownloadOutcome::Gone;
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch object content");
                return DownloadOutcome::TransferFailed;
            }
        };

        if data.len() as u64 != meta.size {
            warn!(
                expected = meta.size,
                received = data.len(),
                "Fetched content does not match listed size"
            );
            return DownloadOutcome::TransferFailed;
        }

        if let Err(e) = self.filesystem.write_file(path, &data).await {
            warn!(path = %path, error = %e, "Failed to write local copy");
            return DownloadOutcome::TransferFailed;
        }

        if let Err(e) = self.filesystem.set_modified(path, meta.modified_at).await {
            warn!(path = %path, error = %e, "Failed to set local modification time");
            return DownloadOutcome::TransferFailed;
        }

        debug!(path = %path, bytes = data.len(), "Object downloaded");
        DownloadOutcome::Downloaded
    }
}
