//! Remote storage port (driven/secondary port)
//!
//! Interface to the object-storage service whose bucket is mirrored.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because transport errors are adapter-specific;
//!   the sync engine classifies them at its own boundary.
//! - "Object no longer exists" is an expected condition between listing
//!   and download, so it is reported as `Ok(None)` rather than an error.
//! - `upload_object` and `delete_object` are management operations; the
//!   sync path never calls them.

use crate::domain::newtypes::{CursorToken, ObjectKey};
use crate::domain::object::ListingPage;

/// Port trait for the remote bucket
#[async_trait::async_trait]
pub trait IRemoteStorage: Send + Sync {
    /// Fetches one page of the bucket listing
    ///
    /// # Arguments
    /// * `prefix` - Only list keys starting with this prefix (`None` = all)
    /// * `cursor` - Token from the previous page (`None` = first page)
    /// * `limit` - Maximum number of items in the page
    /// * `delimiter` - Hierarchy delimiter; keys below it are grouped and
    ///   not returned as objects (`None` = flat listing)
    async fn list_page(
        &self,
        prefix: Option<&str>,
        cursor: Option<&CursorToken>,
        limit: u32,
        delimiter: Option<&str>,
    ) -> anyhow::Result<ListingPage>;

    /// Resolves a URL the object's content can be fetched from
    ///
    /// Returns `Ok(None)` when the object no longer exists.
    async fn resolve_download_url(&self, key: &ObjectKey) -> anyhow::Result<Option<String>>;

    /// Fetches the full content behind a download URL
    ///
    /// Returns `Ok(None)` when the server reports the object gone (404/410).
    async fn fetch(&self, url: &str) -> anyhow::Result<Option<Vec<u8>>>;

    /// Stores `data` under `key`
    ///
    /// Fails if the key exists and `overwrite` is false.
    async fn upload_object(&self, key: &ObjectKey, data: &[u8], overwrite: bool)
        -> anyhow::Result<()>;

    /// Removes the object stored under `key`
    async fn delete_object(&self, key: &ObjectKey) -> anyhow::Result<()>;
}
