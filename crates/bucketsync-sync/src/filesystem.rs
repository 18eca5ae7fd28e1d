//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: Content goes to a uniquely named hidden file in the
//!   target directory, which is then renamed over the mirror path. An
//!   interrupted download never leaves a partial file there, and the
//!   temporary name is never a mirror path of its own.
//! - **Lazy directories**: Parent directories are created on first write.
//! - **Timestamps**: `set_modified` runs `File::set_times` on a blocking
//!   thread; tokio has no async equivalent.

use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use bucketsync_core::{
    domain::SyncPath,
    ports::{FileSystemState, ILocalFileSystem},
};
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

const TEMP_PREFIX: &str = ".bucketsync-";
const TEMP_SUFFIX: &str = ".part";

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// Zero-sized: all context comes from the [`SyncPath`] arguments.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn to_system_time(ts: DateTime<Utc>) -> SystemTime {
    let millis = ts.timestamp_millis();
    if millis >= 0 {
        UNIX_EPOCH + Duration::from_millis(millis.unsigned_abs())
    } else {
        UNIX_EPOCH - Duration::from_millis(millis.unsigned_abs())
    }
}

fn from_system_time(st: SystemTime) -> Option<DateTime<Utc>> {
    st.duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|dur| DateTime::from_timestamp(dur.as_secs() as i64, dur.subsec_nanos()))
}

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(path = %path))]
    async fn get_state(&self, path: &SyncPath) -> anyhow::Result<FileSystemState> {
        let metadata = match tokio::fs::metadata(path.as_path()).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("path not found");
                return Ok(FileSystemState::not_found());
            }
            Err(e) => return Err(e).context("Failed to stat local path"),
        };

        let is_file = metadata.is_file();
        let size = if is_file { metadata.len() } else { 0 };
        let modified = metadata.modified().ok().and_then(from_system_time);

        debug!(exists = true, is_file, size, "state retrieved");

        Ok(FileSystemState {
            exists: true,
            is_file,
            size,
            modified,
        })
    }

    #[instrument(skip(self, data), fields(path = %path, bytes = data.len()))]
    async fn write_file(&self, path: &SyncPath, data: &[u8]) -> anyhow::Result<()> {
        let target = path.as_path().to_path_buf();
        let parent = target
            .parent()
            .map(Path::to_path_buf)
            .with_context(|| format!("{} has no parent directory", target.display()))?;

        tokio::fs::create_dir_all(&parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;

        let data = data.to_vec();
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            // Created exclusively, so it never replaces a mirrored file.
            let mut tmp = tempfile::Builder::new()
                .prefix(TEMP_PREFIX)
                .suffix(TEMP_SUFFIX)
                .tempfile_in(&parent)
                .context("Failed to create temporary file")?;
            debug!(tmp_path = ?tmp.path(), "writing to temporary file");

            tmp.write_all(&data).context("Failed to write temporary file")?;
            tmp.persist(&target)
                .map_err(|e| e.error)
                .context("Failed to move temporary file into place")?;
            Ok(())
        })
        .await
        .context("Write task panicked")??;

        debug!("write complete");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn set_modified(&self, path: &SyncPath, modified: DateTime<Utc>) -> anyhow::Result<()> {
        let target = path.as_path().to_path_buf();
        let mtime = to_system_time(modified);

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let file = std::fs::OpenOptions::new().write(true).open(&target)?;
            file.set_times(std::fs::FileTimes::new().set_modified(mtime))
        })
        .await
        .context("Timestamp task panicked")?
        .context("Failed to set modification time")?;

        debug!(%modified, "modification time set");
        Ok(())
    }
}
