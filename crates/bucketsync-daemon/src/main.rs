//! bucketsync Daemon - Background mirroring service
//!
//! This binary keeps the local mirror current and handles:
//! - Scheduled sync runs every `sync.interval_secs`
//! - On-demand runs through the HTTP trigger endpoint
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Architecture
//!
//! One [`SyncEngine`] is shared by the scheduler and the trigger endpoint,
//! so its run guard keeps scheduled and on-demand runs from overlapping.
//! Both tasks stop when the `CancellationToken` fires.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bucketsync_core::config::{Config, LoggingConfig};
use bucketsync_core::ports::INotificationService;
use bucketsync_remote::provider::BucketStorageProvider;
use bucketsync_remote::push::PushNotificationService;
use bucketsync_sync::engine::SyncEngine;
use bucketsync_sync::filesystem::LocalFileSystemAdapter;
use bucketsync_sync::notifier::Notifier;
use bucketsync_sync::scheduler::SyncScheduler;

mod server;

use server::TriggerServer;

#[derive(Debug, Parser)]
#[command(name = "bucketsyncd", version, about = "bucketsync background mirroring daemon")]
struct Args {
    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// Startup
// ============================================================================

fn init_tracing(logging: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Loads the configuration; a daemon without a valid one cannot start
fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration: {}", messages.join("; "));
    }
    Ok(config)
}

fn build_engine(config: &Config) -> Result<SyncEngine> {
    let remote = Arc::new(BucketStorageProvider::from_config(&config.remote));
    let filesystem = Arc::new(LocalFileSystemAdapter::new());

    let push = PushNotificationService::from_config(&config.notification);
    if push.is_none() {
        info!("No notification destination configured, partial runs are only logged");
    }
    let notifier = Notifier::new(
        push.map(|s| Arc::new(s) as Arc<dyn INotificationService + Send + Sync>),
    );

    SyncEngine::new(remote, filesystem, notifier, &config.sync)
        .context("Failed to create sync engine")
}

// ============================================================================
// Graceful shutdown
// ============================================================================

/// Waits for SIGTERM or SIGINT and triggers the cancellation token
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C)");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }

    token.cancel();
}

// ============================================================================
// Main entry point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let config = load_config(&config_path)?;

    init_tracing(&config.logging);
    info!(
        config_path = %config_path.display(),
        bucket = %config.remote.bucket,
        "bucketsync daemon starting (bucketsyncd)"
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let engine = Arc::new(build_engine(&config)?);

    let server = TriggerServer::bind(Arc::clone(&engine), &config.daemon.listen).await?;
    let server_handle = tokio::spawn(server.run(shutdown.clone()));

    let scheduler = SyncScheduler::new(engine, Duration::from_secs(config.sync.interval_secs));
    let stats = scheduler.run(shutdown.clone()).await;
    info!(runs = stats.runs, rejected = stats.rejected, "Scheduler finished");

    // The scheduler only returns on shutdown, but make sure the server follows.
    shutdown.cancel();
    let result = match server_handle.await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Trigger endpoint task did not finish cleanly");
            Ok(())
        }
    };

    match &result {
        Ok(()) => info!("bucketsync daemon shut down gracefully"),
        Err(e) => error!(error = %e, "bucketsync daemon exiting with error"),
    }
    result
}
