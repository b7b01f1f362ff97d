//! Configuration types for mockgate.

mod route;
mod server;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigurationError, DocumentError};

pub use route::{is_falsy, RouteEntry, DEFAULT_DELAY_MS, DEFAULT_METHOD, DEFAULT_STATUS};
pub use server::{ListenConfig, MetricsConfig, ServerConfig};

/// Document format of a configuration file, chosen by extension
/// (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    /// No recognised extension: tried as JSON, then as YAML.
    Unknown,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Unknown,
        }
    }

    pub fn parse(self, contents: &str) -> Result<Value, DocumentError> {
        match self {
            ConfigFormat::Json => Ok(serde_json::from_str(contents)?),
            ConfigFormat::Yaml => Ok(serde_yaml::from_str(contents)?),
            ConfigFormat::Unknown => match serde_json::from_str(contents) {
                Ok(value) => Ok(value),
                Err(_) => Ok(serde_yaml::from_str(contents)?),
            },
        }
    }
}

/// Mock configuration: a map from exact request path to route entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct MockConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<BTreeMap<String, RouteEntry>>,

    /// Any other top-level keys. Ignored by the dispatcher, but they make the
    /// configuration non-empty.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl MockConfig {
    /// Build a configuration from an iterator of `(path, entry)` pairs.
    pub fn from_routes<I, K>(routes: I) -> Self
    where
        I: IntoIterator<Item = (K, RouteEntry)>,
        K: Into<String>,
    {
        Self {
            routes: Some(routes.into_iter().map(|(k, v)| (k.into(), v)).collect()),
            extra: serde_json::Map::new(),
        }
    }

    /// Load a configuration file. `.yaml`/`.yml` is read as YAML, `.json` as
    /// JSON, anything else is tried as JSON and then as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let value = ConfigFormat::from_path(path)
            .parse(&contents)
            .map_err(|e| ConfigurationError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Self::from_value(value)
    }

    /// Convert a loosely-typed value, checking that it is present and
    /// non-empty. `null` counts as an absent configuration.
    pub fn from_value(value: Value) -> Result<Self, ConfigurationError> {
        match &value {
            Value::Null => return Err(ConfigurationError::Missing),
            Value::Object(map) if map.is_empty() => return Err(ConfigurationError::Missing),
            Value::Object(_) => {}
            other => {
                return Err(ConfigurationError::Malformed(format!(
                    "expected an object at the top level, found {}",
                    value_kind(other)
                )))
            }
        }

        let config: MockConfig = serde_json::from_value(value)
            .map_err(|e| ConfigurationError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// True when no top-level key is present.
    pub fn is_empty(&self) -> bool {
        self.routes.is_none() && self.extra.is_empty()
    }

    /// Check that the configuration and its routes map are non-empty.
    ///
    /// Individual route entries are not inspected here.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.is_empty() {
            return Err(ConfigurationError::Missing);
        }
        match &self.routes {
            Some(routes) if !routes.is_empty() => Ok(()),
            _ => Err(ConfigurationError::MissingRoutes),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
