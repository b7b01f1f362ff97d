//! Mockgate: HTTP middleware that answers configured routes with canned JSON
//! responses and hands every other request to the next service.
//!
//! ```no_run
//! use mockgate::{MockDispatcher, MockLayer};
//! use serde_json::json;
//!
//! let dispatcher = MockDispatcher::from_value(json!({
//!     "routes": {
//!         "/ping": {"response": {"ok": true}},
//!         "/item": {"response": {"id": 1}, "method": "post", "status": 201, "delay": 50}
//!     }
//! }))
//! .expect("valid mock configuration");
//!
//! let layer = MockLayer::new(dispatcher);
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod response;
pub mod server;

pub use config::{MockConfig, RouteEntry, ServerConfig};
pub use dispatcher::{exact_path, Decision, MockDispatcher, MockResponse};
pub use error::{ConfigurationError, RouteConfigurationError};
pub use middleware::{MockLayer, MockService};
pub use server::MockServer;
