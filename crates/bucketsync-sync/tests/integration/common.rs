//! Shared test helpers for engine integration tests
//!
//! [`InMemoryBucket`] implements the remote storage port over a sorted map
//! and paginates like the real service: the cursor is the last key of the
//! previous page.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use tokio::sync::Notify;

use bucketsync_core::config::SyncConfig;
use bucketsync_core::domain::{CursorToken, ListingPage, ObjectKey, RemoteObjectMetadata};
use bucketsync_core::ports::{INotificationService, IRemoteStorage, Notification};
use bucketsync_sync::engine::SyncEngine;
use bucketsync_sync::filesystem::LocalFileSystemAdapter;
use bucketsync_sync::notifier::Notifier;

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Holds a listing call until the test releases it
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct InMemoryBucket {
    objects: Mutex<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
    fail_listing_on_page: Mutex<Option<usize>>,
    gate: Mutex<Option<Arc<Gate>>>,
    list_calls: AtomicUsize,
    downloads: Mutex<Vec<String>>,
}

impl InMemoryBucket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, key: &str, data: &[u8], modified: DateTime<Utc>) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), modified));
    }

    /// The listing call for page `n` (1-based) fails
    pub fn fail_listing_on_page(&self, n: usize) {
        *self.fail_listing_on_page.lock().unwrap() = Some(n);
    }

    /// Every listing call waits on `gate`
    pub fn set_gate(&self, gate: Arc<Gate>) {
        *self.gate.lock().unwrap() = Some(gate);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IRemoteStorage for InMemoryBucket {
    async fn list_page(
        &self,
        prefix: Option<&str>,
        cursor: Option<&CursorToken>,
        limit: u32,
        _delimiter: Option<&str>,
    ) -> anyhow::Result<ListingPage> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if *self.fail_listing_on_page.lock().unwrap() == Some(call) {
            return Err(anyhow!("listing service returned 503"));
        }

        let objects = self.objects.lock().unwrap();
        let after = cursor.map(|c| c.as_str().to_string());
        let mut matching = objects
            .iter()
            .filter(|(k, _)| prefix.map_or(true, |p| k.starts_with(p)))
            .filter(|(k, _)| after.as_ref().map_or(true, |a| k.as_str() > a.as_str()));

        let items: Vec<RemoteObjectMetadata> = matching
            .by_ref()
            .take(limit as usize)
            .map(|(k, (data, modified))| {
                RemoteObjectMetadata::new(
                    ObjectKey::new(k.clone()).unwrap(),
                    data.len() as u64,
                    *modified,
                )
            })
            .collect();

        if matching.next().is_none() {
            return Ok(ListingPage::last(items));
        }
        let last = items.last().map(|m| m.key.to_string()).unwrap_or_default();
        Ok(ListingPage::more(items, CursorToken::new(last)?))
    }

    async fn resolve_download_url(&self, key: &ObjectKey) -> anyhow::Result<Option<String>> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .contains_key(key.as_str())
            .then(|| format!("mem://{key}")))
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let key = url.trim_start_matches("mem://").to_string();
        self.downloads.lock().unwrap().push(key.clone());
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(&key)
            .map(|(data, _)| data.clone()))
    }

    async fn upload_object(&self, key: &ObjectKey, data: &[u8], _overwrite: bool) -> anyhow::Result<()> {
        self.insert(key.as_str(), data, Utc::now());
        Ok(())
    }

    async fn delete_object(&self, key: &ObjectKey) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key.as_str());
        Ok(())
    }
}

/// Notification service counting deliveries
#[derive(Default)]
pub struct CountingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

#[async_trait::async_trait]
impl INotificationService for CountingNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

pub fn sync_config(dir: &TempDir) -> SyncConfig {
    SyncConfig {
        root: dir.path().to_path_buf(),
        ..SyncConfig::default()
    }
}

pub fn build_engine(
    bucket: &Arc<InMemoryBucket>,
    config: &SyncConfig,
    notifications: &Arc<CountingNotifier>,
) -> SyncEngine {
    SyncEngine::new(
        bucket.clone(),
        Arc::new(LocalFileSystemAdapter::new()),
        Notifier::new(Some(notifications.clone())),
        config,
    )
    .expect("valid engine configuration")
}
