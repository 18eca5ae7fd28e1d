//! Domain error types
//!
//! Validation failures for keys, cursor tokens and local paths.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid local path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Object key that cannot be represented or mapped locally
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// Empty or otherwise unusable listing cursor
    #[error("Invalid cursor token: {0}")]
    InvalidCursor(String),

    /// Path resolved outside of the configured sync root
    #[error("Path not within sync root: {0}")]
    PathNotInSyncRoot(String),
}
