//! CLI subcommands
//!
//! Every command receives the resolved configuration path and the output
//! format from the global flags.

pub mod config;
pub mod delete;
pub mod sync;
pub mod upload;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use bucketsync_core::config::Config;

/// Loads and validates the configuration file at `path`
///
/// Commands that talk to the bucket need a real configuration, so a missing
/// file is an error here rather than a silent fallback to defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        anyhow::bail!(
            "Configuration file not found at {}. Create one or pass --config <path>",
            path.display()
        );
    }
    let config = Config::load(path)
        .with_context(|| format!("Failed to parse configuration file {}", path.display()))?;

    let errors = config.validate();
    if !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        anyhow::bail!("Invalid configuration: {}", messages.join("; "));
    }

    info!(config_path = %path.display(), "Loaded configuration");
    Ok(config)
}
