use meshes_events::{Client, ClientOptions};
use wiremock::MockServer;

/// Publishable key accepted by the client's structural check.
pub const TEST_KEY: &str = "mesh_pub_ws-test_sandbox_s3cr3t";

/// Route client logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meshes_events_client=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Base URL of the mock server, shaped like the real API.
pub fn base_url(server: &MockServer) -> String {
    format!("{}/api/v1", server.uri())
}

/// Build a debug-enabled client pointed at `server`.
pub fn client_for(server: &MockServer, options: ClientOptions) -> Client {
    init_tracing();
    Client::new(TEST_KEY, options.api_base_url(base_url(server)).debug(true))
        .expect("test client should build")
}
