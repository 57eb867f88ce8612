//! # meshes-events
//!
//! Client library for emitting events to the Meshes API.
//!
//! Events are validated locally, sent with a publishable key over a fixed
//! header contract, and every failure is reported as a single
//! [`ApiError`] type.
//!
//! ## Crates
//!
//! - **meshes-events-client** - Configuration, validation, header policy and the request pipeline
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use meshes_events::{Client, ClientOptions, Event};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads MESHES_PUBLISHABLE_KEY and friends
//!     let client = Client::from_env()?;
//!
//!     let events = vec![
//!         Event::new("user.signed_up", "ada@example.com"),
//!         Event::new("user.signed_up", "grace@example.com").with_field("plan", "team"),
//!     ];
//!     let result = client.emit_batch(&events, None)?.await?;
//!     println!("{result}");
//!
//!     Ok(())
//! }
//! ```

// Re-export the client crate for convenient access
pub use meshes_events_client as client;

// Re-export commonly used types at the top level
pub use meshes_events_client::{
    ApiError, ApiRequest, Client, ClientConfig, ClientOptions, Event, PendingResponse,
    RequestOptions, Result, Transport,
};

// Every call resolves to a JSON value
pub use serde_json::Value;
