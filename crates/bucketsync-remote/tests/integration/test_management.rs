//! Integration tests for object upload and deletion

use bucketsync_core::ports::IRemoteStorage;
use bucketsync_remote::client::StorageClient;
use bucketsync_remote::provider::BucketStorageProvider;
use wiremock::matchers::{body_bytes, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{self, key, BUCKET};

fn objects_path() -> String {
    format!("/buckets/{BUCKET}/objects")
}

#[tokio::test]
async fn test_upload_sends_body_and_flags() {
    let (server, provider) = common::setup_storage_mock().await;

    Mock::given(method("PUT"))
        .and(path(objects_path()))
        .and(query_param("key", "docs/report.pdf"))
        .and(query_param("overwrite", "true"))
        .and(body_bytes(b"%PDF-1.7".to_vec()))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    provider
        .upload_object(&key("docs/report.pdf"), b"%PDF-1.7", true)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_conflict_without_overwrite() {
    let (server, provider) = common::setup_storage_mock().await;

    Mock::given(method("PUT"))
        .and(path(objects_path()))
        .and(query_param("overwrite", "false"))
        .respond_with(ResponseTemplate::new(409).set_body_string("file exists"))
        .mount(&server)
        .await;

    let err = provider
        .upload_object(&key("a.txt"), b"x", false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn test_upload_retries_after_throttling() {
    let (server, provider) = common::setup_storage_mock().await;

    Mock::given(method("PUT"))
        .and(path(objects_path()))
        .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "0"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(objects_path()))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    provider
        .upload_object(&key("a.txt"), b"payload", false)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.body == b"payload"));
}

#[tokio::test]
async fn test_upload_retries_server_errors() {
    let (server, provider) = common::setup_storage_mock().await;

    Mock::given(method("PUT"))
        .and(path(objects_path()))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(objects_path()))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    provider
        .upload_object(&key("a.txt"), b"x", true)
        .await
        .unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_upload_gives_up_after_retry_limit() {
    let server = MockServer::start().await;
    let provider = BucketStorageProvider::new(
        StorageClient::with_base_url("tok", server.uri()).with_max_retries(2),
    );

    Mock::given(method("PUT"))
        .and(path(objects_path()))
        .respond_with(ResponseTemplate::new(429).append_header("Retry-After", "0"))
        .mount(&server)
        .await;

    let err = provider
        .upload_object(&key("a.txt"), b"x", true)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Too many requests"));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_object() {
    let (server, provider) = common::setup_storage_mock().await;

    Mock::given(method("DELETE"))
        .and(path(objects_path()))
        .and(query_param("key", "old/file.txt"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    provider.delete_object(&key("old/file.txt")).await.unwrap();
}

#[tokio::test]
async fn test_delete_unauthorized_is_an_error() {
    let (server, provider) = common::setup_storage_mock().await;

    Mock::given(method("DELETE"))
        .and(path(objects_path()))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = provider.delete_object(&key("a.txt")).await.unwrap_err();
    assert!(format!("{err:#}").contains("Unauthorized"));
}
