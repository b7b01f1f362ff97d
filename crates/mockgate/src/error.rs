//! Error types for mock configuration and request dispatch.

use std::path::PathBuf;

/// Raised while building a dispatcher or loading its configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("No mock configuration received")]
    Missing,
    #[error("Routes map not added, see the README for the routes map format")]
    MissingRoutes,
    #[error("Malformed mock configuration: {0}")]
    Malformed(String),
    #[error("Failed to read mock configuration {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse mock configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// A configuration document that is not valid JSON or YAML.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Raised while handling a request whose route is unknown or misconfigured.
///
/// Every variant names the offending route so the fault can be traced back to
/// the routes map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteConfigurationError {
    #[error("No mock configured for route {route}, see the README for the routes map format")]
    Unmatched { route: String },
    #[error(
        "Error in the mock value received for route {route}, see the README for the mandatory route parameters"
    )]
    MissingResponse { route: String },
    #[error("Invalid status {status} configured for route {route}, expected a value in 100..=999")]
    InvalidStatus { route: String, status: u16 },
}

impl RouteConfigurationError {
    /// The exact path the fault was raised for.
    pub fn route(&self) -> &str {
        match self {
            RouteConfigurationError::Unmatched { route }
            | RouteConfigurationError::MissingResponse { route }
            | RouteConfigurationError::InvalidStatus { route, .. } => route,
        }
    }
}
