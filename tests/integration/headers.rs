use meshes_events::{Client, ClientOptions, Event, RequestOptions};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{client_for, TEST_KEY};

#[test]
fn test_reserved_header_rejected_at_construction() {
    for name in ["Accept", "content-type", "X-Meshes-Client", "x-meshes-publishable-key"] {
        let result = Client::new(TEST_KEY, ClientOptions::new().header(name, "override"));
        assert!(result.is_err(), "{name} should be rejected");
    }
}

#[tokio::test]
async fn test_reserved_header_dropped_per_call() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .and(header("Accept", "application/json"))
        .and(header("X-Meshes-Publishable-Key", TEST_KEY))
        .and(header("X-Meshes-Client", meshes_events::client::CLIENT_ID))
        .and(header("X-Request-Id", "req-1"))
        .and(header("X-Team", "growth"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, ClientOptions::new().header("X-Team", "growth"));
    let options = RequestOptions::new()
        .header("accept", "text/html")
        .header("X-Meshes-Publishable-Key", "mesh_pub_other_ws_key")
        .header(" X-Request-Id ", " req-1 ");

    client
        .emit(&Event::new("x", "a@b.com"), Some(options))
        .unwrap()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_options_from_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/events"))
        .and(header("X-Region", "eu"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let options = ClientOptions::from_json(&serde_json::json!({
        "version": "v1",
        "timeout": 8000,
        "headers": {"X-Region": "eu"},
        "apiBaseUrl": crate::common::base_url(&server)
    }))
    .unwrap();
    let client = Client::new(TEST_KEY, options).unwrap();

    client
        .emit(&Event::new("x", "a@b.com"), None)
        .unwrap()
        .await
        .unwrap();
}
