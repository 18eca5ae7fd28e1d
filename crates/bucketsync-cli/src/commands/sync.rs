//! Sync command - Mirror the bucket once
//!
//! Provides the `bucketsync sync` CLI command which:
//! 1. Loads and validates the configuration
//! 2. Creates the storage, filesystem and notification adapters
//! 3. Runs one sync and prints the run summary
//!
//! The command fails when the listing was cut short, so scripts and timers
//! can tell a partial walk from a complete one.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use bucketsync_core::domain::RunResult;
use bucketsync_core::ports::INotificationService;
use bucketsync_remote::provider::BucketStorageProvider;
use bucketsync_remote::push::PushNotificationService;
use bucketsync_sync::engine::SyncEngine;
use bucketsync_sync::filesystem::LocalFileSystemAdapter;
use bucketsync_sync::notifier::Notifier;

use crate::commands::load_config;
use crate::output::{format_duration, get_formatter, plural, OutputFormat, OutputFormatter};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Only mirror keys below this prefix (overrides sync.prefix)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Parallel downloads per page (overrides sync.download_concurrency)
    #[arg(long)]
    pub concurrency: Option<usize>,
}

impl SyncCommand {
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let mut config = load_config(config_path)?;

        if let Some(prefix) = &self.prefix {
            config.sync.prefix = prefix.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.sync.download_concurrency = concurrency;
        }

        let remote = Arc::new(BucketStorageProvider::from_config(&config.remote));
        let filesystem = Arc::new(LocalFileSystemAdapter::new());
        let notifier = Notifier::new(
            PushNotificationService::from_config(&config.notification)
                .map(|s| Arc::new(s) as Arc<dyn INotificationService + Send + Sync>),
        );

        let engine = SyncEngine::new(remote, filesystem, notifier, &config.sync)
            .context("Failed to create sync engine")?;

        info!(bucket = %config.remote.bucket, root = %engine.root(), "Starting one-shot sync");
        formatter.info(&format!(
            "Mirroring bucket '{}' into {}",
            config.remote.bucket,
            engine.root()
        ));

        let result = engine.trigger_sync().await;

        if format.is_json() {
            let json = serde_json::to_value(&result).context("Failed to serialize run result")?;
            formatter.print_json(&json);
        } else {
            print_summary(formatter.as_ref(), &result);
        }

        if let Some(reason) = &result.aborted {
            anyhow::bail!("Sync run aborted: {reason}");
        }
        if result.rejected {
            anyhow::bail!("Another sync run is already in progress");
        }
        Ok(())
    }
}

fn print_summary(formatter: &dyn OutputFormatter, result: &RunResult) {
    let duration = format_duration(result.duration_ms);

    if result.is_aborted() {
        formatter.error(&format!("Sync stopped early after {duration}"));
    } else if result.downloaded == 0 && result.is_complete() {
        formatter.success(&format!("Already up to date ({duration})"));
    } else {
        formatter.success(&format!("Sync completed in {duration}"));
    }

    formatter.info(&format!(
        "Bucket:     {} object{} in {} page{}",
        result.total_seen,
        plural(result.total_seen),
        result.pages,
        plural(result.pages)
    ));
    formatter.info(&format!("Synced:     {}", result.successfully_synced));
    if result.downloaded > 0 {
        formatter.info(&format!(
            "Downloaded: {} file{}",
            result.downloaded,
            plural(result.downloaded)
        ));
    }
    if result.gone > 0 {
        formatter.info(&format!("Gone:       {} (deleted during the run)", result.gone));
    }
    if result.failed > 0 {
        formatter.warn(&format!(
            "{} object{} could not be synced",
            result.failed,
            plural(result.failed)
        ));
    }
    if let Some(reason) = &result.aborted {
        formatter.info(&format!("Reason:     {reason}"));
    }
}
