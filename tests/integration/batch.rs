use meshes_events::{ClientOptions, Event};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::client_for;

fn events(count: usize) -> Vec<Event> {
    (0..count)
        .map(|i| Event::new(format!("evt.{i}"), format!("user{i}@example.com")))
        .collect()
}

#[tokio::test]
async fn test_batch_dispatches_one_bulk_request() {
    let server = MockServer::start().await;
    let batch = events(100);

    Mock::given(method("POST"))
        .and(path("/api/v1/events/bulk"))
        .and(body_json(&batch))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"accepted": 100})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::default());
    let result = client.emit_batch(&batch, None).unwrap().await.unwrap();
    assert_eq!(result, json!({"accepted": 100}));
}

#[tokio::test]
async fn test_batch_size_limits_fail_synchronously() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::default());
    assert!(client.emit_batch(&events(0), None).is_err());
    assert!(client.emit_batch(&events(101), None).is_err());
}

#[tokio::test]
async fn test_batch_single_event() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events/bulk"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::default());
    let result = client.emit_batch(&events(1), None).unwrap().await.unwrap();
    assert!(result.is_null());
}

#[tokio::test]
async fn test_batch_with_callback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events/bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::default());
    let (tx, rx) = tokio::sync::oneshot::channel();
    client
        .emit_batch_with_callback(&events(3), None, move |result| {
            let _ = tx.send(result);
        })
        .unwrap();

    assert_eq!(rx.await.unwrap().unwrap(), json!({"ok": true}));
}
