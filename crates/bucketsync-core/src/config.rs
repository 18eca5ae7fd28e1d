//! Configuration module for bucketsync.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable consulted when `remote.access_token` is not set.
pub const ACCESS_TOKEN_ENV: &str = "BUCKETSYNC_ACCESS_TOKEN";

/// Largest page size the storage service accepts.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Upper bound for `sync.download_concurrency`.
pub const MAX_DOWNLOAD_CONCURRENCY: usize = 32;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for bucketsync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
    pub notification: NotificationConfig,
    pub logging: LoggingConfig,
    pub daemon: DaemonConfig,
}

/// Remote storage service settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the storage service API.
    pub endpoint: String,
    /// Name of the bucket to mirror.
    pub bucket: String,
    /// Bearer token; falls back to the `BUCKETSYNC_ACCESS_TOKEN` variable.
    pub access_token: Option<String>,
    /// Base URL serving objects without signing (public buckets).
    pub public_domain: Option<String>,
    /// Lifetime in seconds of signed download links.
    pub link_expiry_secs: u64,
}

/// Synchronization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root directory of the local mirror. A leading `~/` is expanded.
    pub root: PathBuf,
    /// Only mirror keys starting with this prefix; empty mirrors everything.
    pub prefix: String,
    /// Objects requested per listing page.
    pub page_limit: u32,
    /// Listing delimiter; empty requests a flat listing.
    pub delimiter: String,
    /// Downloads in flight at once within a page.
    pub download_concurrency: usize,
    /// Seconds between scheduled runs in the daemon.
    pub interval_secs: u64,
}

/// Push notification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Push key identifying the recipient; `None` disables notifications.
    pub destination: Option<String>,
    /// Base URL of the push service.
    pub endpoint: String,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level: one of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: String,
    /// Output format: `text` or `json`.
    pub format: String,
}

/// Daemon settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Address the trigger endpoint listens on.
    pub listen: String,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/bucketsync/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("bucketsync")
            .join("config.yaml")
    }
}

impl RemoteConfig {
    /// The configured token, or the one from the environment.
    pub fn resolve_access_token(&self) -> Option<String> {
        self.access_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var(ACCESS_TOKEN_ENV).ok().filter(|t| !t.is_empty()))
    }
}

impl SyncConfig {
    /// The mirror root with a leading `~` expanded to the home directory.
    pub fn resolved_root(&self) -> PathBuf {
        expand_home(&self.root)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            bucket: String::new(),
            access_token: None,
            public_domain: None,
            link_expiry_secs: 300,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join("BucketMirror"),
            prefix: String::new(),
            page_limit: MAX_PAGE_LIMIT,
            delimiter: String::new(),
            download_concurrency: 1,
            interval_secs: 3600,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            destination: None,
            endpoint: "https://sctapi.ftqq.com".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8730".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"sync.page_limit"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["text", "json"];

fn check_http_url(field: &str, value: &str, errors: &mut Vec<ValidationError>) {
    match url::Url::parse(value) {
        Ok(u) if matches!(u.scheme(), "http" | "https") => {}
        Ok(u) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}', expected http or https", u.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {e}"))),
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- remote ---
        if self.remote.endpoint.is_empty() {
            errors.push(ValidationError::new("remote.endpoint", "is required"));
        } else {
            check_http_url("remote.endpoint", &self.remote.endpoint, &mut errors);
        }
        if self.remote.bucket.trim().is_empty() {
            errors.push(ValidationError::new("remote.bucket", "is required"));
        }
        if let Some(domain) = &self.remote.public_domain {
            check_http_url("remote.public_domain", domain, &mut errors);
        }
        if self.remote.link_expiry_secs == 0 {
            errors.push(ValidationError::new(
                "remote.link_expiry_secs",
                "must be greater than 0",
            ));
        }

        // --- sync ---
        if self.sync.root.as_os_str().is_empty() {
            errors.push(ValidationError::new("sync.root", "is required"));
        } else if !self.sync.resolved_root().is_absolute() {
            errors.push(ValidationError::new(
                "sync.root",
                format!("must be an absolute path, got '{}'", self.sync.root.display()),
            ));
        }
        if self.sync.page_limit == 0 || self.sync.page_limit > MAX_PAGE_LIMIT {
            errors.push(ValidationError::new(
                "sync.page_limit",
                format!("must be between 1 and {MAX_PAGE_LIMIT}"),
            ));
        }
        if self.sync.download_concurrency == 0
            || self.sync.download_concurrency > MAX_DOWNLOAD_CONCURRENCY
        {
            errors.push(ValidationError::new(
                "sync.download_concurrency",
                format!("must be between 1 and {MAX_DOWNLOAD_CONCURRENCY}"),
            ));
        }
        if self.sync.interval_secs == 0 {
            errors.push(ValidationError::new(
                "sync.interval_secs",
                "must be greater than 0",
            ));
        }

        // --- notification ---
        if let Some(dest) = &self.notification.destination {
            if dest.trim().is_empty() {
                errors.push(ValidationError::new(
                    "notification.destination",
                    "must not be blank; remove it to disable notifications",
                ));
            }
            check_http_url("notification.endpoint", &self.notification.endpoint, &mut errors);
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError::new(
                "logging.level",
                format!(
                    "invalid level '{}', expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError::new(
                "logging.format",
                format!(
                    "invalid format '{}', expected one of: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        // --- daemon ---
        if self.daemon.listen.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::new(
                "daemon.listen",
                format!("'{}' is not a valid socket address", self.daemon.listen),
            ));
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use bucketsync_core::config::ConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = ConfigBuilder::new()
///     .remote_endpoint("https://storage.example.com")
///     .remote_bucket("photos")
///     .sync_root(PathBuf::from("/srv/photos"))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- remote ---

    pub fn remote_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.remote.endpoint = endpoint.into();
        self
    }

    pub fn remote_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.remote.bucket = bucket.into();
        self
    }

    pub fn remote_access_token(mut self, token: impl Into<String>) -> Self {
        self.config.remote.access_token = Some(token.into());
        self
    }

    pub fn remote_public_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.remote.public_domain = Some(domain.into());
        self
    }

    // --- sync ---

    pub fn sync_root(mut self, root: PathBuf) -> Self {
        self.config.sync.root = root;
        self
    }

    pub fn sync_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.sync.prefix = prefix.into();
        self
    }

    pub fn sync_page_limit(mut self, limit: u32) -> Self {
        self.config.sync.page_limit = limit;
        self
    }

    pub fn sync_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.sync.delimiter = delimiter.into();
        self
    }

    pub fn sync_download_concurrency(mut self, n: usize) -> Self {
        self.config.sync.download_concurrency = n;
        self
    }

    pub fn sync_interval_secs(mut self, seconds: u64) -> Self {
        self.config.sync.interval_secs = seconds;
        self
    }

    // --- notification ---

    pub fn notification_destination(mut self, destination: impl Into<String>) -> Self {
        self.config.notification.destination = Some(destination.into());
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- daemon ---

    pub fn daemon_listen(mut self, listen: impl Into<String>) -> Self {
        self.config.daemon.listen = listen.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
