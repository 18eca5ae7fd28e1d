//! Delete command - Remove one object from the bucket

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use bucketsync_core::domain::ObjectKey;
use bucketsync_core::ports::IRemoteStorage;
use bucketsync_remote::provider::BucketStorageProvider;

use crate::commands::load_config;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Key of the object to delete
    pub key: String,
}

impl DeleteCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let config = load_config(config_path)?;
        let key = ObjectKey::new(self.key.clone()).context("Invalid object key")?;

        info!(key = %key, "Deleting object");

        BucketStorageProvider::from_config(&config.remote)
            .delete_object(&key)
            .await?;

        if format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "key": key.as_str(),
                "bucket": config.remote.bucket,
            }));
        } else {
            formatter.success(&format!(
                "Deleted '{}' from bucket '{}'",
                key, config.remote.bucket
            ));
        }
        Ok(())
    }
}
