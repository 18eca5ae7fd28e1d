//! End-to-end mirroring into a temporary directory

use std::sync::Arc;

use bucketsync_core::config::SyncConfig;
use tempfile::TempDir;

use crate::common::{self, CountingNotifier, InMemoryBucket};

#[tokio::test]
async fn test_mirrors_nested_keys_and_stamps_mtime() {
    let dir = TempDir::new().unwrap();
    let bucket = InMemoryBucket::new();
    bucket.insert("2019/06/beach.jpg", b"jpeg", common::ts(1_560_000_000));
    bucket.insert("notes.txt", b"hello", common::ts(1_600_000_000));
    let notifications = Arc::new(CountingNotifier::default());
    let engine = common::build_engine(&bucket, &common::sync_config(&dir), &notifications);

    let result = engine.trigger_sync().await;

    assert_eq!(result.total_seen, 2);
    assert_eq!(result.downloaded, 2);
    assert!(result.is_complete());
    assert_eq!(
        std::fs::read(dir.path().join("2019/06/beach.jpg")).unwrap(),
        b"jpeg"
    );
    let mtime = std::fs::metadata(dir.path().join("notes.txt"))
        .unwrap()
        .modified()
        .unwrap();
    let secs = mtime
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    assert_eq!(secs, 1_600_000_000);
    assert!(notifications.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_second_run_downloads_nothing() {
    let dir = TempDir::new().unwrap();
    let bucket = InMemoryBucket::new();
    bucket.insert("a.txt", b"aaa", common::ts(1_000));
    bucket.insert("b.txt", b"bbb", common::ts(2_000));
    let notifications = Arc::new(CountingNotifier::default());
    let engine = common::build_engine(&bucket, &common::sync_config(&dir), &notifications);

    engine.trigger_sync().await;
    let second = engine.trigger_sync().await;

    assert_eq!(second.total_seen, 2);
    assert_eq!(second.skipped, 2);
    assert_eq!(second.downloaded, 0);
    assert_eq!(second.successfully_synced, 2);
    assert_eq!(bucket.downloads().len(), 2);
}

#[tokio::test]
async fn test_total_seen_sums_all_pages() {
    let dir = TempDir::new().unwrap();
    let bucket = InMemoryBucket::new();
    for i in 0..5 {
        bucket.insert(&format!("k{i}"), b"v", common::ts(10));
    }
    let config = SyncConfig {
        page_limit: 2,
        ..common::sync_config(&dir)
    };
    let notifications = Arc::new(CountingNotifier::default());
    let engine = common::build_engine(&bucket, &config, &notifications);

    let result = engine.trigger_sync().await;

    assert_eq!(result.pages, 3);
    assert_eq!(result.total_seen, 5);
    assert_eq!(bucket.list_calls(), 3);
}

#[tokio::test]
async fn test_stale_and_empty_copies_are_replaced() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("stale.txt"), b"old").unwrap();
    std::fs::write(dir.path().join("empty.txt"), b"").unwrap();
    let bucket = InMemoryBucket::new();
    // Far in the future so the freshly written local copy is older
    bucket.insert("stale.txt", b"new content", common::ts(4_000_000_000));
    bucket.insert("empty.txt", b"filled", common::ts(0));
    let notifications = Arc::new(CountingNotifier::default());
    let engine = common::build_engine(&bucket, &common::sync_config(&dir), &notifications);

    let result = engine.trigger_sync().await;

    assert_eq!(result.downloaded, 2);
    assert_eq!(
        std::fs::read(dir.path().join("stale.txt")).unwrap(),
        b"new content"
    );
    assert_eq!(std::fs::read(dir.path().join("empty.txt")).unwrap(), b"filled");
}

#[tokio::test]
async fn test_local_only_files_are_left_alone() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("mine.txt"), b"local only").unwrap();
    let bucket = InMemoryBucket::new();
    bucket.insert("theirs.txt", b"remote", common::ts(10));
    let notifications = Arc::new(CountingNotifier::default());
    let engine = common::build_engine(&bucket, &common::sync_config(&dir), &notifications);

    engine.trigger_sync().await;

    assert_eq!(
        std::fs::read(dir.path().join("mine.txt")).unwrap(),
        b"local only"
    );
    assert!(dir.path().join("theirs.txt").exists());
}

#[tokio::test]
async fn test_prefix_limits_the_walk() {
    let dir = TempDir::new().unwrap();
    let bucket = InMemoryBucket::new();
    bucket.insert("photos/a.jpg", b"a", common::ts(10));
    bucket.insert("videos/b.mp4", b"b", common::ts(10));
    let config = SyncConfig {
        prefix: "photos/".into(),
        ..common::sync_config(&dir)
    };
    let notifications = Arc::new(CountingNotifier::default());
    let engine = common::build_engine(&bucket, &config, &notifications);

    let result = engine.trigger_sync().await;

    assert_eq!(result.total_seen, 1);
    assert!(dir.path().join("photos/a.jpg").exists());
    assert!(!dir.path().join("videos").exists());
}

#[tokio::test]
async fn test_listing_failure_keeps_partial_counts() {
    let dir = TempDir::new().unwrap();
    let bucket = InMemoryBucket::new();
    for k in ["a", "b", "c", "d"] {
        bucket.insert(k, b"x", common::ts(10));
    }
    bucket.fail_listing_on_page(2);
    let config = SyncConfig {
        page_limit: 2,
        ..common::sync_config(&dir)
    };
    let notifications = Arc::new(CountingNotifier::default());
    let engine = common::build_engine(&bucket, &config, &notifications);

    let result = engine.trigger_sync().await;

    assert_eq!(result.total_seen, 2);
    assert_eq!(result.successfully_synced, 2);
    assert!(result.aborted.as_deref().unwrap().contains("503"));
    assert!(!engine.guard().is_running());
    assert!(notifications.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_downloads_mirror_everything() {
    let dir = TempDir::new().unwrap();
    let bucket = InMemoryBucket::new();
    for i in 0..20 {
        bucket.insert(&format!("dir{}/file{i}.bin", i % 3), &[i as u8; 16], common::ts(10));
    }
    let config = SyncConfig {
        download_concurrency: 8,
        page_limit: 7,
        ..common::sync_config(&dir)
    };
    let notifications = Arc::new(CountingNotifier::default());
    let engine = common::build_engine(&bucket, &config, &notifications);

    let result = engine.trigger_sync().await;

    assert_eq!(result.total_seen, 20);
    assert_eq!(result.downloaded, 20);
    assert_eq!(result.pages, 3);
}

#[tokio::test]
async fn test_dot_tmp_sibling_keys_are_both_mirrored() {
    let dir = TempDir::new().unwrap();
    let bucket = InMemoryBucket::new();
    bucket.insert("foo", b"foo", common::ts(1_000));
    bucket.insert("foo.tmp", b"tmp!!", common::ts(1_000));
    bucket.insert("dir/foo", b"nested", common::ts(1_000));
    bucket.insert("dir/foo.tmp", b"nested tmp", common::ts(1_000));
    let config = SyncConfig {
        download_concurrency: 4,
        ..common::sync_config(&dir)
    };
    let notifications = Arc::new(CountingNotifier::default());
    let engine = common::build_engine(&bucket, &config, &notifications);

    let first = engine.trigger_sync().await;

    assert_eq!(first.downloaded, 4);
    assert_eq!(first.successfully_synced, 4);
    assert_eq!(std::fs::read(dir.path().join("foo")).unwrap(), b"foo");
    assert_eq!(std::fs::read(dir.path().join("foo.tmp")).unwrap(), b"tmp!!");
    assert_eq!(std::fs::read(dir.path().join("dir/foo")).unwrap(), b"nested");
    assert_eq!(
        std::fs::read(dir.path().join("dir/foo.tmp")).unwrap(),
        b"nested tmp"
    );

    let second = engine.trigger_sync().await;

    assert_eq!(second.downloaded, 0);
    assert_eq!(second.skipped, 4);
    assert_eq!(bucket.downloads().len(), 4);
    assert!(notifications.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_concurrent_downloads_of_similar_names_keep_each_content() {
    let dir = TempDir::new().unwrap();
    let bucket = InMemoryBucket::new();
    let names = [
        "report",
        "report.tmp",
        "report.tmp.tmp",
        "report.txt",
        "report.txt.bak",
        "reports/report",
        ".report",
    ];
    for (i, name) in names.iter().enumerate() {
        let body = vec![b'a' + i as u8; 100 * (i + 1)];
        bucket.insert(name, &body, common::ts(2_000));
    }
    let config = SyncConfig {
        download_concurrency: 8,
        ..common::sync_config(&dir)
    };
    let notifications = Arc::new(CountingNotifier::default());
    let engine = common::build_engine(&bucket, &config, &notifications);

    let result = engine.trigger_sync().await;

    assert_eq!(result.downloaded, names.len() as u64);
    assert!(result.is_complete());
    for (i, name) in names.iter().enumerate() {
        let content = std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(content.len(), 100 * (i + 1), "size of {name}");
        assert!(content.iter().all(|&b| b == b'a' + i as u8), "content of {name}");
    }

    let second = engine.trigger_sync().await;
    assert_eq!(second.skipped, names.len() as u64);
}
