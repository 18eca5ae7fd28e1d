//! Upload command - Put one local file into the bucket

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use bucketsync_core::domain::ObjectKey;
use bucketsync_core::ports::IRemoteStorage;
use bucketsync_remote::provider::BucketStorageProvider;

use crate::commands::load_config;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Local file to upload
    pub file: PathBuf,

    /// Object key (defaults to the file name)
    #[arg(long)]
    pub key: Option<String>,

    /// Replace an existing object with the same key
    #[arg(long)]
    pub overwrite: bool,
}

impl UploadCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let config = load_config(config_path)?;

        let key = object_key_for(&self.file, self.key.as_deref())?;
        let data = tokio::fs::read(&self.file)
            .await
            .with_context(|| format!("Failed to read {}", self.file.display()))?;

        info!(key = %key, bytes = data.len(), overwrite = self.overwrite, "Uploading file");

        let provider = BucketStorageProvider::from_config(&config.remote);
        provider
            .upload_object(&key, &data, self.overwrite)
            .await
            .with_context(|| format!("Failed to upload {}", self.file.display()))?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key.as_str(),
                "bytes": data.len(),
                "bucket": config.remote.bucket,
            }));
        } else {
            formatter.success(&format!("Uploaded {} as '{}'", self.file.display(), key));
            formatter.info(&format!("{} bytes to bucket '{}'", data.len(), config.remote.bucket));
        }
        Ok(())
    }
}

/// The explicit key, or the file name of `file`
fn object_key_for(file: &Path, key: Option<&str>) -> Result<ObjectKey> {
    let raw = match key {
        Some(k) => k.to_string(),
        None => file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("Cannot derive an object key from {}", file.display()))?,
    };
    ObjectKey::new(raw).context("Invalid object key")
}
