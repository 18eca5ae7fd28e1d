//! Local filesystem port (driven/secondary port)
//!
//! Interface for inspecting and writing the local mirror.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - `get_state` never fails for a missing path; it returns
//!   [`FileSystemState::not_found`] instead.

use chrono::{DateTime, Utc};

use crate::domain::newtypes::SyncPath;

/// Snapshot of a path's state on the local filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemState {
    /// Whether anything exists at the path
    pub exists: bool,
    /// Whether this is a regular file (false for directories and other types)
    pub is_file: bool,
    /// Size in bytes (0 for directories or non-existent files)
    pub size: u64,
    /// Last modification time (None if unavailable or the path doesn't exist)
    pub modified: Option<DateTime<Utc>>,
}

impl FileSystemState {
    /// Returns a state representing a non-existent path
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            exists: false,
            is_file: false,
            size: 0,
            modified: None,
        }
    }

    /// Returns a state describing a regular file
    #[must_use]
    pub fn file(size: u64, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            exists: true,
            is_file: true,
            size,
            modified,
        }
    }

    /// Returns true if the path exists and is a regular file
    #[must_use]
    pub fn is_regular_file(&self) -> bool {
        self.exists && self.is_file
    }

    /// Returns true if the path exists and is not a regular file
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.exists && !self.is_file
    }
}

/// Port trait for local filesystem operations
///
/// ## Implementation Notes
///
/// - All paths are `SyncPath` instances, which are guaranteed to be absolute.
/// - `write_file` must create missing parent directories and must never
///   leave a partially written file at the target path.
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Returns the current state of a path
    async fn get_state(&self, path: &SyncPath) -> anyhow::Result<FileSystemState>;

    /// Writes data to a file, replacing any existing content
    async fn write_file(&self, path: &SyncPath, data: &[u8]) -> anyhow::Result<()>;

    /// Sets the modification time of an existing file
    async fn set_modified(&self, path: &SyncPath, modified: DateTime<Utc>) -> anyhow::Result<()>;
}
