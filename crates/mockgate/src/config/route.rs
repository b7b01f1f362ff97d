//! Route entry configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_STATUS: u16 = 200;
pub const DEFAULT_DELAY_MS: u64 = 0;

/// Mock behavior for one exact path.
///
/// Only `response` is mandatory, and its presence is checked when a request
/// for the route arrives rather than when the configuration is loaded.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RouteEntry {
    /// Payload written as the JSON response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// HTTP verb, compared case-insensitively (default GET)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Response status code (default 200, 0 also means default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Milliseconds to wait before the response is emitted (default 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<u64>,
}

impl RouteEntry {
    pub fn new(response: Value) -> Self {
        Self {
            response: Some(response),
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(delay_ms);
        self
    }

    /// The configured payload, or `None` when it is absent or falsy.
    pub fn payload(&self) -> Option<&Value> {
        self.response.as_ref().filter(|v| !is_falsy(v))
    }

    pub fn method(&self) -> &str {
        self.method
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_METHOD)
    }

    pub fn status(&self) -> u16 {
        match self.status {
            Some(0) | None => DEFAULT_STATUS,
            Some(status) => status,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay.unwrap_or(DEFAULT_DELAY_MS))
    }

    /// Whether a request method selects this entry. Both sides are compared
    /// without regard to ASCII case.
    pub fn accepts_method(&self, method: &str) -> bool {
        self.method().eq_ignore_ascii_case(method)
    }
}

/// `null`, `false`, `0` and `""` do not count as a configured payload.
/// Empty objects and arrays do.
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map(|f| f == 0.0 || f.is_nan()).unwrap_or(false),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
