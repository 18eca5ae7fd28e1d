//! Bucket listing requests
//!
//! The service lists a bucket in pages of at most `limit` objects. Each
//! response carries an opaque `marker`; sending it back returns the next
//! page. A missing or empty marker means the listing is complete.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bucketsync_remote::client::StorageClient;
//! use bucketsync_remote::listing;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = StorageClient::new("https://storage.example.com", "photos", None);
//! let page = listing::list_page(&client, None, None, 1000, None).await?;
//! println!("Got {} objects", page.items.len());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};

use bucketsync_core::domain::{CursorToken, ListingPage, ObjectKey, RemoteObjectMetadata};

use crate::client::{check_status, StorageClient};

/// `putTime` ticks per second (100 ns resolution)
const TICKS_PER_SECOND: i64 = 10_000_000;

// ============================================================================
// Listing response types (JSON deserialization)
// ============================================================================

/// Raw response of `GET /buckets/{bucket}/objects`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<ListedObject>,

    /// Cursor for the next page; absent or empty on the last page
    marker: Option<String>,

    /// Pseudo-directories grouped by the delimiter
    #[serde(default)]
    common_prefixes: Vec<String>,
}

/// One object entry of a listing page
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedObject {
    key: String,

    /// Size in bytes
    fsize: u64,

    /// Upload time in 100-nanosecond units since the Unix epoch
    put_time: i64,

    #[allow(dead_code)]
    hash: Option<String>,

    #[allow(dead_code)]
    mime_type: Option<String>,
}

// ============================================================================
// Parsing
// ============================================================================

/// Converts a `putTime` value to a UTC timestamp
pub fn put_time_to_datetime(put_time: i64) -> Option<DateTime<Utc>> {
    let secs = put_time.div_euclid(TICKS_PER_SECOND);
    let nanos = (put_time.rem_euclid(TICKS_PER_SECOND) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}

fn parse_item(raw: ListedObject) -> Option<RemoteObjectMetadata> {
    let key = match ObjectKey::new(raw.key) {
        Ok(key) => key,
        Err(e) => {
            warn!(error = %e, "Skipping listed object with invalid key");
            return None;
        }
    };
    let Some(modified_at) = put_time_to_datetime(raw.put_time) else {
        warn!(key = %key, put_time = raw.put_time, "Skipping listed object with invalid putTime");
        return None;
    };
    Some(RemoteObjectMetadata::new(key, raw.fsize, modified_at))
}

fn parse_response(response: ListResponse) -> ListingPage {
    if !response.common_prefixes.is_empty() {
        debug!(
            prefixes = response.common_prefixes.len(),
            "Ignoring common prefixes in listing page"
        );
    }

    let items: Vec<_> = response.items.into_iter().filter_map(parse_item).collect();

    match response
        .marker
        .filter(|m| !m.is_empty())
        .and_then(|m| CursorToken::new(m).ok())
    {
        Some(cursor) => ListingPage::more(items, cursor),
        None => ListingPage::last(items),
    }
}

// ============================================================================
// Request
// ============================================================================

/// Fetches one listing page
///
/// Absent arguments are omitted from the query string. No retries: the
/// caller decides what a failed page means for its walk.
pub async fn list_page(
    client: &StorageClient,
    prefix: Option<&str>,
    cursor: Option<&CursorToken>,
    limit: u32,
    delimiter: Option<&str>,
) -> Result<ListingPage> {
    let mut query: Vec<(&str, String)> = vec![("limit", limit.to_string())];
    if let Some(prefix) = prefix {
        query.push(("prefix", prefix.to_string()));
    }
    if let Some(cursor) = cursor {
        query.push(("marker", cursor.as_str().to_string()));
    }
    if let Some(delimiter) = delimiter {
        query.push(("delimiter", delimiter.to_string()));
    }

    debug!(
        bucket = client.bucket(),
        has_cursor = cursor.is_some(),
        limit,
        "Requesting listing page"
    );

    let response = client
        .request(Method::GET, &client.bucket_path("/objects"))
        .query(&query)
        .send()
        .await
        .context("Failed to send listing request")?;
    let response = check_status(response)
        .await
        .context("Listing request returned error status")?;
    let raw: ListResponse = response
        .json()
        .await
        .context("Failed to parse listing response")?;

    let page = parse_response(raw);
    debug!(items = page.len(), is_last = page.is_last, "Listing page received");
    Ok(page)
}
