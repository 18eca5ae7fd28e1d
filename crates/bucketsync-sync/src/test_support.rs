//! In-memory port implementations for unit tests

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::anyhow;
use chrono::{DateTime, TimeZone, Utc};

use bucketsync_core::domain::{
    CursorToken, ListingPage, ObjectKey, RemoteObjectMetadata, SyncPath,
};
use bucketsync_core::ports::{
    FileSystemState, ILocalFileSystem, INotificationService, IRemoteStorage, Notification,
};

pub fn key(s: &str) -> ObjectKey {
    ObjectKey::new(s.to_string()).unwrap()
}

pub fn token(s: &str) -> CursorToken {
    CursorToken::new(s.to_string()).unwrap()
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn meta(k: &str, size: u64, modified_secs: i64) -> RemoteObjectMetadata {
    RemoteObjectMetadata::new(key(k), size, ts(modified_secs))
}

pub fn root() -> SyncPath {
    SyncPath::new(PathBuf::from("/mirror")).unwrap()
}

/// A listing call as seen by the remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    pub prefix: Option<String>,
    pub cursor: Option<String>,
    pub limit: u32,
    pub delimiter: Option<String>,
}

/// Remote storage serving a scripted sequence of listing responses
#[derive(Default)]
pub struct ScriptedRemote {
    pages: Mutex<VecDeque<Result<ListingPage, String>>>,
    calls: Mutex<Vec<ListCall>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
    url_errors: Mutex<HashSet<String>>,
    fetch_errors: Mutex<HashSet<String>>,
    gone: Mutex<HashSet<String>>,
    fetched: Mutex<Vec<String>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: ListingPage) {
        self.pages.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_failure(&self, message: &str) {
        self.pages.lock().unwrap().push_back(Err(message.to_string()));
    }

    pub fn put(&self, key: &str, data: &[u8]) {
        self.contents
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn fail_url(&self, key: &str) {
        self.url_errors.lock().unwrap().insert(key.to_string());
    }

    pub fn fail_fetch(&self, key: &str) {
        self.fetch_errors.lock().unwrap().insert(key.to_string());
    }

    pub fn mark_gone(&self, key: &str) {
        self.gone.lock().unwrap().insert(key.to_string());
    }

    pub fn calls(&self) -> Vec<ListCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IRemoteStorage for ScriptedRemote {
    async fn list_page(
        &self,
        prefix: Option<&str>,
        cursor: Option<&CursorToken>,
        limit: u32,
        delimiter: Option<&str>,
    ) -> anyhow::Result<ListingPage> {
        self.calls.lock().unwrap().push(ListCall {
            prefix: prefix.map(str::to_string),
            cursor: cursor.map(|c| c.as_str().to_string()),
            limit,
            delimiter: delimiter.map(str::to_string),
        });
        match self.pages.lock().unwrap().pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no more scripted pages")),
        }
    }

    async fn resolve_download_url(&self, key: &ObjectKey) -> anyhow::Result<Option<String>> {
        if self.url_errors.lock().unwrap().contains(key.as_str()) {
            return Err(anyhow!("link service unavailable"));
        }
        Ok(Some(format!("mem://{}", key.as_str())))
    }

    async fn fetch(&self, url: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let k = url.trim_start_matches("mem://").to_string();
        self.fetched.lock().unwrap().push(k.clone());
        if self.fetch_errors.lock().unwrap().contains(&k) {
            return Err(anyhow!("connection reset"));
        }
        if self.gone.lock().unwrap().contains(&k) {
            return Ok(None);
        }
        Ok(Some(
            self.contents.lock().unwrap().get(&k).cloned().unwrap_or_default(),
        ))
    }

    async fn upload_object(&self, key: &ObjectKey, data: &[u8], _overwrite: bool) -> anyhow::Result<()> {
        self.put(key.as_str(), data);
        Ok(())
    }

    async fn delete_object(&self, key: &ObjectKey) -> anyhow::Result<()> {
        self.contents.lock().unwrap().remove(key.as_str());
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct MemFile {
    data: Vec<u8>,
    modified: Option<DateTime<Utc>>,
}

/// Filesystem kept entirely in memory
#[derive(Default)]
pub struct MemoryFileSystem {
    files: Mutex<HashMap<PathBuf, MemFile>>,
    dirs: Mutex<HashSet<PathBuf>>,
    broken: Mutex<HashSet<PathBuf>>,
    read_only: Mutex<HashSet<PathBuf>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: &Path, data: &[u8], modified: Option<DateTime<Utc>>) {
        self.files.lock().unwrap().insert(
            path.to_path_buf(),
            MemFile {
                data: data.to_vec(),
                modified,
            },
        );
    }

    pub fn add_dir(&self, path: &Path) {
        self.dirs.lock().unwrap().insert(path.to_path_buf());
    }

    /// `get_state` fails for this path
    pub fn break_path(&self, path: &Path) {
        self.broken.lock().unwrap().insert(path.to_path_buf());
    }

    /// `write_file` fails for this path
    pub fn make_read_only(&self, path: &Path) {
        self.read_only.lock().unwrap().insert(path.to_path_buf());
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).map(|f| f.data.clone())
    }

    pub fn modified(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.files.lock().unwrap().get(path).and_then(|f| f.modified)
    }
}

#[async_trait::async_trait]
impl ILocalFileSystem for MemoryFileSystem {
    async fn get_state(&self, path: &SyncPath) -> anyhow::Result<FileSystemState> {
        let p = path.as_path();
        if self.broken.lock().unwrap().contains(p) {
            return Err(anyhow!("permission denied"));
        }
        if let Some(file) = self.files.lock().unwrap().get(p) {
            return Ok(FileSystemState::file(file.data.len() as u64, file.modified));
        }
        if self.dirs.lock().unwrap().contains(p) {
            return Ok(FileSystemState {
                exists: true,
                is_file: false,
                size: 0,
                modified: None,
            });
        }
        Ok(FileSystemState::not_found())
    }

    async fn write_file(&self, path: &SyncPath, data: &[u8]) -> anyhow::Result<()> {
        if self.read_only.lock().unwrap().contains(path.as_path()) {
            return Err(anyhow!("read-only file system"));
        }
        self.add_file(path.as_path(), data, Some(Utc::now()));
        Ok(())
    }

    async fn set_modified(&self, path: &SyncPath, modified: DateTime<Utc>) -> anyhow::Result<()> {
        match self.files.lock().unwrap().get_mut(path.as_path()) {
            Some(file) => {
                file.modified = Some(modified);
                Ok(())
            }
            None => Err(anyhow!("no such file")),
        }
    }
}

/// Notification service that remembers what it was asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl INotificationService for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(anyhow!("push service returned 500"));
        }
        Ok(())
    }
}
