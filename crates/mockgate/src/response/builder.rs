use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use hyper::{HeaderMap, Response, StatusCode};
use serde_json::Value;
use std::str::FromStr;

/// Builds JSON responses for mocked routes and for server-side errors.
///
/// The body type is any `From<Bytes>` body, so the same builder serves the
/// middleware (generic over the downstream body) and the host server.
pub struct JsonResponseBuilder {
    status: StatusCode,
    body: Option<Bytes>,
    headers: HeaderMap,
}

impl JsonResponseBuilder {
    pub fn new(status_code: StatusCode) -> Self {
        JsonResponseBuilder {
            status: status_code,
            body: None,
            headers: Default::default(),
        }
    }

    /// Serialize `value` as the response body.
    pub fn json(mut self, value: &Value) -> Self {
        // Serializing a `Value` cannot fail: every key is already a string.
        let payload = serde_json::to_vec(value).unwrap_or_default();
        self.body = Some(Bytes::from(payload));
        self
    }

    /// Body of the form `{"error": "<message>"}`.
    pub fn error(self, message: impl Into<String>) -> Self {
        self.json(&serde_json::json!({ "error": message.into() }))
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::from_str(name), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
                self
            }
            _ => self,
        }
    }

    pub fn build<B: From<Bytes>>(self) -> Response<B> {
        let payload = self.body.unwrap_or_default();
        let mut response = Response::new(B::from(payload));
        *response.status_mut() = self.status;

        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response.headers_mut().extend(self.headers);
        response
    }
}
