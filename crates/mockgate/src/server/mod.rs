//! Host HTTP server that puts the mock middleware in front of a downstream.
//!
//! - `host`: MockServer and the accept loop
//! - `downstream`: handling for deferred requests (forward or 404)
//! - `client`: pooled client used for forwarding
//! - `network`: listener creation

mod client;
mod downstream;
mod host;
mod network;

pub use client::{create_http_client, HttpClient};
pub use downstream::Downstream;
pub use host::MockServer;
pub use network::create_listener;
