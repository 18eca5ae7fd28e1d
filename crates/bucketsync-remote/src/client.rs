//! Storage service API client
//!
//! Wraps `reqwest::Client` with the service base URL, the bucket name and
//! bearer authentication.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bucketsync_remote::client::StorageClient;
//! use reqwest::Method;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = StorageClient::new("https://storage.example.com", "photos", Some("token".into()));
//! let response = client
//!     .request(Method::GET, &client.bucket_path("/objects"))
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, warn};

use crate::RemoteError;

/// Default retry-after duration when the header is missing or unreadable
pub(crate) const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Maximum number of extra attempts for throttled or failed requests
const DEFAULT_MAX_RETRIES: u32 = 3;

/// First backoff step for 5xx responses; doubles on each attempt
const BASE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// HTTP client for one bucket on the storage service
#[derive(Debug, Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    bucket: String,
    access_token: Option<String>,
    max_retries: u32,
}

impl StorageClient {
    /// Creates a client for `bucket` on the service at `base_url`
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            access_token,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Creates a client pointing at a custom base URL (useful for testing)
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self::new(base_url, "test-bucket", Some(access_token.into()))
    }

    /// Overrides the bucket name
    #[must_use]
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    /// Overrides how many times throttled or failed requests are retried
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns a reference to the underlying reqwest Client
    ///
    /// Used for requests to absolute URLs such as signed download links.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// API path of a resource below this client's bucket
    pub fn bucket_path(&self, suffix: &str) -> String {
        format!("/buckets/{}{suffix}", encode_component(&self.bucket))
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// Prepends the base URL and adds the Authorization header when a token
    /// is configured.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, &url);
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request, retrying on 429 and 5xx responses
    ///
    /// `build` is called once per attempt so request bodies can be replayed.
    /// 429 responses wait for `Retry-After`; 5xx responses back off
    /// exponentially from one second. The final response is returned as is,
    /// whatever its status.
    pub async fn execute_with_retry<F>(&self, build: F, what: &str) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let response = build()
                .send()
                .await
                .with_context(|| format!("Failed to send {what} request"))?;
            let status = response.status();

            let retryable =
                status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if !retryable {
                if attempt > 0 {
                    info!(what, attempt, "Request succeeded after retry");
                }
                return Ok(response);
            }

            if attempt >= self.max_retries {
                warn!(what, %status, attempts = attempt + 1, "Retry limit exhausted");
                return Ok(response);
            }

            let delay = if status == StatusCode::TOO_MANY_REQUESTS {
                response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
                    .unwrap_or(DEFAULT_RETRY_AFTER)
            } else {
                BASE_RETRY_DELAY * 2u32.pow(attempt)
            };

            info!(
                what,
                %status,
                attempt,
                retry_after_ms = delay.as_millis() as u64,
                "Transient failure, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Percent-encodes a path component, spaces as `%20`
///
/// `/` is encoded too, so an object key always forms a single component.
pub fn encode_component(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Turns a non-success response into a [`RemoteError`]
pub(crate) async fn check_status(response: Response) -> Result<Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!(%status, body = %body, "Storage service returned an error");
    Err(RemoteError::from_status(status, body.trim()))
}

/// Parses a `Retry-After` value given in seconds or as an HTTP date
///
/// Dates more than an hour away are ignored in favor of `default`.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let now = chrono::Utc::now();
        let target = date.with_timezone(&chrono::Utc);
        if target > now {
            if let Some(secs) = (target - now)
                .num_seconds()
                .try_into()
                .ok()
                .filter(|&s: &u64| s <= 3600)
            {
                return Duration::from_secs(secs);
            }
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
