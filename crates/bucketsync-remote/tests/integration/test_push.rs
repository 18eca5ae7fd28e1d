//! Integration tests for the push notification adapter

use bucketsync_core::ports::{INotificationService, Notification};
use bucketsync_remote::push::PushNotificationService;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_notification_is_sent_with_title_and_body() {
    let server = MockServer::start().await;
    let service = PushNotificationService::new(server.uri(), "SCT123");

    Mock::given(method("GET"))
        .and(path("/SCT123.send"))
        .and(query_param("title", "[sync] Bucket sync incomplete"))
        .and(query_param("desp", "3 of 5 synced"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 0,
            "message": "",
            "data": { "pushid": "1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    service
        .notify(&Notification::sync("Bucket sync incomplete", "3 of 5 synced"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_gateway_error_code_is_an_error() {
    let server = MockServer::start().await;
    let service = PushNotificationService::new(server.uri(), "bad-key");

    Mock::given(method("GET"))
        .and(path("/bad-key.send"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "code": 40001,
            "message": "bad pushtoken"
        })))
        .mount(&server)
        .await;

    let err = service
        .notify(&Notification::new("t", "b"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("bad pushtoken"));
}

#[tokio::test]
async fn test_http_error_is_an_error() {
    let server = MockServer::start().await;
    let service = PushNotificationService::new(server.uri(), "k");

    Mock::given(method("GET"))
        .and(path("/k.send"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(service.notify(&Notification::new("t", "b")).await.is_err());
}

#[tokio::test]
async fn test_plain_text_success_is_accepted() {
    let server = MockServer::start().await;
    let service = PushNotificationService::new(server.uri(), "k");

    Mock::given(method("GET"))
        .and(path("/k.send"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    service.notify(&Notification::new("t", "b")).await.unwrap();
}
