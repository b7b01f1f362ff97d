//! Mock dispatcher: decides whether a request is answered from the routes map
//! or passed on to downstream handling.
//!
//! The dispatcher owns an immutable snapshot of the routes map taken at
//! construction. Cloning it is cheap and every clone shares the same table, so
//! one dispatcher can serve any number of concurrent requests without locking.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hyper::{Request, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::config::{MockConfig, RouteEntry};
use crate::error::{ConfigurationError, RouteConfigurationError};

/// A canned response selected for a request.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    /// Exact path of the route that produced this response
    pub route: String,
    pub status: StatusCode,
    pub body: Value,
    pub delay: Duration,
}

/// Outcome of dispatching a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Answer with the mock response once its delay has elapsed
    Respond(MockResponse),
    /// The route exists but is configured for another method
    Defer,
}

#[derive(Debug, Clone)]
pub struct MockDispatcher {
    routes: Arc<BTreeMap<String, RouteEntry>>,
}

impl MockDispatcher {
    /// Build a dispatcher, rejecting an empty configuration or routes map.
    pub fn new(config: MockConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let routes = config.routes.unwrap_or_default();
        debug!("Mock dispatcher built with {} route(s)", routes.len());
        Ok(Self {
            routes: Arc::new(routes),
        })
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigurationError> {
        Self::new(MockConfig::from_value(value)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        Self::new(MockConfig::from_file(path)?)
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    pub fn routes(&self) -> impl Iterator<Item = (&str, &RouteEntry)> {
        self.routes.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    /// Decide how to handle a request for `path_and_query` with `method`.
    ///
    /// Anything from the first `?` onwards is ignored for the lookup. A path
    /// with no entry, or whose entry has no usable response, is a fault rather
    /// than a fall-through.
    pub fn dispatch(
        &self,
        path_and_query: &str,
        method: &str,
    ) -> Result<Decision, RouteConfigurationError> {
        let route = exact_path(path_and_query);

        let entry = self
            .routes
            .get(route)
            .ok_or_else(|| RouteConfigurationError::Unmatched {
                route: route.to_string(),
            })?;

        let body = entry
            .payload()
            .ok_or_else(|| RouteConfigurationError::MissingResponse {
                route: route.to_string(),
            })?;

        if !entry.accepts_method(method) {
            debug!(
                "Route {} is mocked for {}, deferring {} request",
                route,
                entry.method(),
                method
            );
            return Ok(Decision::Defer);
        }

        let status = StatusCode::from_u16(entry.status()).map_err(|_| {
            RouteConfigurationError::InvalidStatus {
                route: route.to_string(),
                status: entry.status(),
            }
        })?;

        debug!(
            "Mocking {} {} with status {} after {}ms",
            method,
            route,
            status.as_u16(),
            entry.delay().as_millis()
        );

        Ok(Decision::Respond(MockResponse {
            route: route.to_string(),
            status,
            body: body.clone(),
            delay: entry.delay(),
        }))
    }

    /// Dispatch an HTTP request using its URI and method.
    pub fn handle<B>(&self, req: &Request<B>) -> Result<Decision, RouteConfigurationError> {
        let uri = req.uri();
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        self.dispatch(path_and_query, req.method().as_str())
    }
}

/// Strip the query string, if any, from a request target.
pub fn exact_path(path_and_query: &str) -> &str {
    match path_and_query.split_once('?') {
        Some((path, _)) => path,
        None => path_and_query,
    }
}
