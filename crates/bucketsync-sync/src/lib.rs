//! bucketsync Sync - Bucket mirroring engine
//!
//! Provides:
//! - Paginated listing walk with loop protection
//! - Per-object freshness decisions against the local mirror
//! - Downloads with size verification and mtime stamping
//! - Single-flight run orchestration and partial-failure notification
//!
//! ## Modules
//!
//! - [`cursor`] - Listing cursor over the remote storage port
//! - [`freshness`] - Local copy evaluation
//! - [`download`] - Object download executor
//! - [`guard`] - Single-flight run guard
//! - [`engine`] - Run orchestration
//! - [`notifier`] - Partial-failure notifications
//! - [`scheduler`] - Periodic trigger loop
//! - [`filesystem`] - Local filesystem adapter (atomic writes)

pub mod cursor;
pub mod download;
pub mod engine;
pub mod filesystem;
pub mod freshness;
pub mod guard;
pub mod notifier;
pub mod scheduler;

#[cfg(test)]
mod test_support;

use thiserror::Error;

/// Errors that can occur during synchronization operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// The listing call to the remote service failed
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// The listing returned a cursor that cannot lead to termination
    #[error("Malformed listing cursor: {0}")]
    MalformedCursor(String),

    /// The engine was built with unusable settings
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A domain-level error propagated from bucketsync-core
    #[error("Domain error: {0}")]
    Domain(#[from] bucketsync_core::domain::DomainError),

    /// An I/O error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Returns true if this error ends pagination for the current run
    pub fn is_listing_failure(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteUnavailable(_) | SyncError::MalformedCursor(_)
        )
    }
}
