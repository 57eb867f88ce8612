//! # meshes-events-client
//!
//! Core client for emitting events to the Meshes API with a publishable key.
//!
//! This crate provides:
//! - Construction-time validation of the publishable key and options
//! - Per-event validation before anything touches the network
//! - A header contract that caller headers can never override
//! - Per-request deadlines
//! - Uniform error reporting through [`ApiError`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Client                              │
//! │  - emit / emit_batch (validate synchronously)               │
//! │  - awaitable or callback delivery                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Request pipeline                         │
//! │  - option layering, header cleaning, URL/body building      │
//! │  - deadline, body classification, error wrapping            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Transport                             │
//! │  - one HTTP exchange per call (reqwest by default)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use meshes_events_client::{Client, ClientOptions, Event, RequestOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), meshes_events_client::ApiError> {
//!     let client = Client::new("mesh_pub_ws_prod_abc123", ClientOptions::default())?;
//!
//!     let event = Event::new("user.signed_up", "ada@example.com")
//!         .with_field("plan", "pro");
//!     let created = client
//!         .emit(&event, Some(RequestOptions::new().header("X-Request-Id", "r-1")))?
//!         .await?;
//!
//!     println!("{created}");
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod event;
pub mod headers;
mod request;
mod response;
mod transport;

pub use client::{Client, DeadlineExceeded, PendingResponse};
pub use config::{
    validate_publishable_key, validate_timeout, ClientConfig, ClientOptions, DEFAULT_HOST,
    DEFAULT_TIMEOUT, MAX_TIMEOUT, MIN_TIMEOUT, SUPPORTED_VERSION,
};
pub use error::{ApiError, BoxError, Result, ERROR_NAME};
pub use event::{validate_batch, validate_event, Event, MAX_BATCH_SIZE};
pub use request::{
    ApiRequest, RequestBody, RequestMethod, RequestOptions, BULK_EVENTS_PATH, EVENTS_PATH,
};
pub use response::{parse_body, read_body};
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};

/// Value of the client identity header.
pub const CLIENT_ID: &str = concat!("meshes-events-rust/", env!("CARGO_PKG_VERSION"));
