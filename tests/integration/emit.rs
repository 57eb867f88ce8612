use std::time::Duration;

use meshes_events::{ClientOptions, Event, RequestOptions, Value};
use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{client_for, TEST_KEY};

#[tokio::test]
async fn test_emit_returns_parsed_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .and(header("X-Meshes-Publishable-Key", TEST_KEY))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id":"evt_1"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::default());
    let result = client
        .emit(&Event::new("user.signed_up", "a@b.com"), None)
        .unwrap()
        .await
        .unwrap();

    assert_eq!(result, json!({"id": "evt_1"}));
}

#[tokio::test]
async fn test_emit_text_and_empty_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .and(query_param("mode", "text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .and(query_param("mode", "empty"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::default());
    let event = Event::new("x", "a@b.com");

    let text = client
        .emit(&event, Some(RequestOptions::new().query("mode", "text")))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(text, json!("OK"));

    let empty = client
        .emit(&event, Some(RequestOptions::new().query("mode", "empty")))
        .unwrap()
        .await
        .unwrap();
    assert_eq!(empty, Value::Null);
}

#[tokio::test]
async fn test_emit_sends_event_verbatim() {
    let server = MockServer::start().await;
    let raw = r#"{"event":"order.placed","payload":{"email":"a@b.com","items":[{"sku":"A1","qty":2}]},"resource":"order","resource_id":"ord_9"}"#;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .and(body_string(raw))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let record: Value = serde_json::from_str(raw).unwrap();
    let client = client_for(&server, ClientOptions::default());
    client.emit(&record, None).unwrap().await.unwrap();
}

#[tokio::test]
async fn test_emit_remote_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"nope"}"#))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::default());
    let err = client
        .emit(&Event::new("x", "a@b.com"), None)
        .unwrap()
        .await
        .unwrap_err();

    assert_eq!(err.name(), "MeshesApiError");
    assert_eq!(err.message, "Meshes API request failed");
    assert_eq!(
        err.data,
        Some(json!({"status": 401, "statusText": "Unauthorized", "data": {"error": "nope"}}))
    );
}

#[tokio::test]
async fn test_emit_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::default());
    let options = RequestOptions::new().timeout(Duration::from_millis(1000));
    let err = client
        .emit(&Event::new("x", "a@b.com"), Some(options))
        .unwrap()
        .await
        .unwrap_err();

    assert_eq!(err.message, "Request Failure");
    assert!(err.data.is_some());
}

#[tokio::test]
async fn test_emit_connection_refused() {
    let client = meshes_events::Client::new(
        TEST_KEY,
        ClientOptions::new().api_base_url("http://127.0.0.1:1/api/v1"),
    )
    .unwrap();

    let err = client
        .emit(&Event::new("x", "a@b.com"), None)
        .unwrap()
        .await
        .unwrap_err();
    assert_eq!(err.message, "Request Failure");
}

#[tokio::test]
async fn test_emit_invalid_event_never_dispatches() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::default());
    let err = client
        .emit(&json!({"event": "x", "payload": {"name": "no email"}}), None)
        .unwrap_err();
    assert_eq!(err.message, "Event payload.email is required");
}

#[tokio::test]
async fn test_emit_with_callback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::default());
    let (tx, rx) = tokio::sync::oneshot::channel();

    let returned = client.emit_with_callback(&Event::new("x", "a@b.com"), None, move |result| {
        let _ = tx.send(result);
    });
    assert!(returned.is_ok());

    let err = rx.await.unwrap().unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.data.unwrap()["data"], "boom");
}
