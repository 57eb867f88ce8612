use meshes_events::{Client, Event};

/// Smoke test against the real API.
///
/// Requires `MESHES_PUBLISHABLE_KEY` (and optionally `MESHES_API_BASE_URL`).
#[tokio::test]
#[ignore = "requires a Meshes publishable key"]
async fn test_live_emit() {
    crate::common::init_tracing();
    let client = Client::from_env().expect("MESHES_PUBLISHABLE_KEY must be set for live tests");

    let result = client
        .emit(
            &Event::new("sdk.smoke_test", "smoke@example.com").with_field("sdk", "rust"),
            None,
        )
        .expect("event should validate")
        .await;

    assert!(result.is_ok(), "live emit failed: {:?}", result.err());
}
