//! Server-push notification adapter
//!
//! Delivers [`Notification`]s through a push gateway addressed by a
//! per-recipient key: `GET {endpoint}/{destination}.send?title=..&desp=..`.
//!
//! ## Design Notes
//!
//! - The gateway answers 200 even for some rejected messages, so the JSON
//!   body is checked for a non-zero `code` or `errno`.
//! - Priority and category have no gateway equivalent; the category is
//!   prefixed to the title when set.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use bucketsync_core::config::NotificationConfig;
use bucketsync_core::ports::{INotificationService, Notification};

use crate::client::{check_status, encode_component};

/// Gateway reply; both error fields are optional
#[derive(Debug, Default, Deserialize)]
struct PushResponse {
    code: Option<i64>,
    errno: Option<i64>,
    message: Option<String>,
    errmsg: Option<String>,
}

impl PushResponse {
    fn error_code(&self) -> Option<i64> {
        self.code.or(self.errno).filter(|&c| c != 0)
    }

    fn error_message(&self) -> &str {
        self.message
            .as_deref()
            .or(self.errmsg.as_deref())
            .unwrap_or("no message")
    }
}

/// [`INotificationService`] adapter for the push gateway
#[derive(Debug, Clone)]
pub struct PushNotificationService {
    client: Client,
    endpoint: String,
    destination: String,
}

impl PushNotificationService {
    pub fn new(endpoint: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            destination: destination.into(),
        }
    }

    /// Builds the service when a destination is configured
    pub fn from_config(config: &NotificationConfig) -> Option<Self> {
        config
            .destination
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(|d| Self::new(config.endpoint.clone(), d))
    }

    fn send_url(&self) -> String {
        format!("{}/{}.send", self.endpoint, encode_component(&self.destination))
    }
}

fn title_of(notification: &Notification) -> String {
    if notification.category.is_empty() {
        notification.title.clone()
    } else {
        format!("[{}] {}", notification.category, notification.title)
    }
}

#[async_trait::async_trait]
impl INotificationService for PushNotificationService {
    #[instrument(skip(self, notification), fields(title = %notification.title))]
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .get(self.send_url())
            .query(&[
                ("title", title_of(notification)),
                ("desp", notification.body.clone()),
            ])
            .send()
            .await
            .context("Failed to send push notification")?;

        let body = check_status(response)
            .await
            .context("Push gateway returned error status")?
            .text()
            .await
            .context("Failed to read push gateway response")?;

        // Non-JSON bodies on a 2xx are accepted as delivered.
        let reply: PushResponse = serde_json::from_str(&body).unwrap_or_default();
        if let Some(code) = reply.error_code() {
            anyhow::bail!("Push gateway rejected notification ({code}): {}", reply.error_message());
        }

        debug!("Push notification delivered");
        Ok(())
    }
}
