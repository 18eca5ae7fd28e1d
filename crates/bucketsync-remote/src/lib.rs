//! bucketsync Remote - HTTP adapters
//!
//! Provides async clients for:
//! - Paginated bucket listings
//! - Download link resolution (public domain or signed links)
//! - Object upload and deletion
//! - Server-push notifications
//!
//! ## Modules
//!
//! - [`client`] - Authenticated storage API client with retry handling
//! - [`listing`] - Listing requests and response parsing
//! - [`provider`] - `IRemoteStorage` implementation
//! - [`push`] - `INotificationService` implementation

pub mod client;
pub mod listing;
pub mod provider;
pub mod push;

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when communicating with the storage service
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Credentials are missing, invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested bucket or object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The object already exists and overwriting was not requested
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded; retry after the specified duration
    #[error("Too many requests, retry after {retry_after:?}")]
    TooManyRequests {
        /// Duration to wait before retrying
        retry_after: Duration,
    },

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Classifies a non-success HTTP status
    pub fn from_status(status: StatusCode, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        let detail = if detail.is_empty() {
            status.to_string()
        } else {
            format!("{status}: {detail}")
        };
        match status {
            StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(detail),
            StatusCode::FORBIDDEN => RemoteError::Forbidden(detail),
            StatusCode::NOT_FOUND | StatusCode::GONE => RemoteError::NotFound(detail),
            StatusCode::CONFLICT => RemoteError::Conflict(detail),
            StatusCode::TOO_MANY_REQUESTS => RemoteError::TooManyRequests {
                retry_after: client::DEFAULT_RETRY_AFTER,
            },
            s if s.is_server_error() => RemoteError::ServerError(detail),
            _ => RemoteError::InvalidResponse(detail),
        }
    }
}
