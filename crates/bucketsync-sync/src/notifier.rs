//! Partial-failure notifications
//!
//! After each run the engine hands the totals to [`Notifier`], which pushes
//! a message when some listed objects were left unsynced. Delivery problems
//! are logged and otherwise ignored.

use std::sync::Arc;

use tracing::{info, warn};

use bucketsync_core::ports::{INotificationService, Notification};

const TITLE: &str = "Bucket sync incomplete";

/// Sends a notification for runs that did not sync everything
#[derive(Clone)]
pub struct Notifier {
    service: Option<Arc<dyn INotificationService + Send + Sync>>,
}

impl Notifier {
    pub fn new(service: Option<Arc<dyn INotificationService + Send + Sync>>) -> Self {
        Self { service }
    }

    /// A notifier that never sends anything
    pub fn disabled() -> Self {
        Self { service: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.service.is_some()
    }

    /// Reports a run that synced `success` of `total` objects
    ///
    /// Returns true if a delivery was attempted.
    pub async fn notify(&self, total: u64, success: u64) -> bool {
        if success >= total {
            return false;
        }
        let Some(service) = &self.service else {
            return false;
        };

        let notification = Notification::sync(
            TITLE,
            format!("The bucket holds {total} files; {success} were synced in this run"),
        );

        match service.notify(&notification).await {
            Ok(()) => info!(total, success, "Sent incomplete-sync notification"),
            Err(e) => warn!(total, success, error = %e, "Failed to deliver notification"),
        }
        true
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
