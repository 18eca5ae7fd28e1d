//! BucketStorageProvider - IRemoteStorage implementation over HTTP
//!
//! Wraps the [`StorageClient`] and delegates to the listing module to fulfil
//! the [`IRemoteStorage`] port contract.
//!
//! ## Design Notes
//!
//! - Public buckets are served from a configured domain without signing:
//!   `{public_domain}/{encoded key}`.
//! - Private buckets get a time-limited signed link from the service's
//!   link endpoint. A 404 there means the object is gone.
//! - Download URLs may point outside the API, so they are fetched without
//!   the bearer token.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use bucketsync_core::config::RemoteConfig;
use bucketsync_core::domain::{CursorToken, ListingPage, ObjectKey};
use bucketsync_core::ports::IRemoteStorage;

use crate::client::{check_status, encode_component, StorageClient};
use crate::listing;
use crate::RemoteError;

/// Response of `GET /buckets/{bucket}/link`
#[derive(Debug, Deserialize)]
struct LinkResponse {
    url: String,
}

/// [`IRemoteStorage`] adapter for the storage service
pub struct BucketStorageProvider {
    client: StorageClient,
    public_domain: Option<String>,
    link_expiry: Duration,
}

impl BucketStorageProvider {
    pub fn new(client: StorageClient) -> Self {
        Self {
            client,
            public_domain: None,
            link_expiry: Duration::from_secs(300),
        }
    }

    /// Builds a provider from the `remote` configuration section
    pub fn from_config(config: &RemoteConfig) -> Self {
        let client = StorageClient::new(
            config.endpoint.clone(),
            config.bucket.clone(),
            config.resolve_access_token(),
        );
        let provider = Self::new(client).with_link_expiry(Duration::from_secs(config.link_expiry_secs));
        match &config.public_domain {
            Some(domain) => provider.with_public_domain(domain.clone()),
            None => provider,
        }
    }

    /// Serves downloads from `domain` instead of signed links
    #[must_use]
    pub fn with_public_domain(mut self, domain: impl Into<String>) -> Self {
        self.public_domain = Some(domain.into().trim_end_matches('/').to_string());
        self
    }

    /// Lifetime requested for signed links
    #[must_use]
    pub fn with_link_expiry(mut self, expiry: Duration) -> Self {
        self.link_expiry = expiry;
        self
    }

    pub fn client(&self) -> &StorageClient {
        &self.client
    }

    async fn signed_link(&self, key: &ObjectKey) -> Result<Option<String>> {
        let response = self
            .client
            .request(Method::GET, &self.client.bucket_path("/link"))
            .query(&[
                ("key", key.as_str().to_string()),
                ("expires", self.link_expiry.as_secs().to_string()),
            ])
            .send()
            .await
            .context("Failed to request download link")?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let link: LinkResponse = check_status(response)
            .await
            .context("Link request returned error status")?
            .json()
            .await
            .context("Failed to parse link response")?;
        Ok(Some(link.url))
    }
}

/// Public download URL of `key` below `domain`
pub fn public_url(domain: &str, key: &ObjectKey) -> String {
    format!("{}/{}", domain.trim_end_matches('/'), encode_component(key.as_str()))
}

#[async_trait::async_trait]
impl IRemoteStorage for BucketStorageProvider {
    async fn list_page(
        &self,
        prefix: Option<&str>,
        cursor: Option<&CursorToken>,
        limit: u32,
        delimiter: Option<&str>,
    ) -> Result<ListingPage> {
        listing::list_page(&self.client, prefix, cursor, limit, delimiter).await
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn resolve_download_url(&self, key: &ObjectKey) -> Result<Option<String>> {
        match &self.public_domain {
            Some(domain) => Ok(Some(public_url(domain, key))),
            None => self.signed_link(key).await,
        }
    }

    #[instrument(skip(self, url))]
    async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .client()
            .get(url)
            .send()
            .await
            .context("Failed to send download request")?;

        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::GONE) {
            debug!(status = %response.status(), "Object gone at download URL");
            return Ok(None);
        }

        let bytes = check_status(response)
            .await
            .context("Download request returned error status")?
            .bytes()
            .await
            .context("Failed to read download response body")?;

        debug!(bytes = bytes.len(), "Downloaded object content");
        Ok(Some(bytes.to_vec()))
    }

    #[instrument(skip(self, data), fields(key = %key, bytes = data.len()))]
    async fn upload_object(&self, key: &ObjectKey, data: &[u8], overwrite: bool) -> Result<()> {
        let path = self.client.bucket_path("/objects");
        let response = self
            .client
            .execute_with_retry(
                || {
                    self.client
                        .request(Method::PUT, &path)
                        .query(&[
                            ("key", key.as_str().to_string()),
                            ("overwrite", overwrite.to_string()),
                        ])
                        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                        .body(data.to_vec())
                },
                "upload",
            )
            .await?;

        match check_status(response).await {
            Ok(_) => {
                debug!("Upload complete");
                Ok(())
            }
            Err(RemoteError::Conflict(_)) => {
                anyhow::bail!("Object '{key}' already exists; pass overwrite to replace it")
            }
            Err(e) => Err(e).context("Upload request returned error status"),
        }
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn delete_object(&self, key: &ObjectKey) -> Result<()> {
        let path = self.client.bucket_path("/objects");
        let response = self
            .client
            .execute_with_retry(
                || {
                    self.client
                        .request(Method::DELETE, &path)
                        .query(&[("key", key.as_str())])
                },
                "delete",
            )
            .await?;

        check_status(response)
            .await
            .with_context(|| format!("Failed to delete object '{key}'"))?;
        debug!("Delete complete");
        Ok(())
    }
}
