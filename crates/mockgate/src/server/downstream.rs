//! Downstream handling for requests the mock middleware defers.
//!
//! With an upstream configured the request is forwarded there; otherwise the
//! request is answered with a JSON 404.

use super::client::HttpClient;
use crate::metrics;
use crate::response::JsonResponseBuilder;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, error};

#[derive(Clone)]
pub enum Downstream {
    NotFound,
    Forward {
        client: HttpClient,
        upstream: Arc<str>,
    },
}

impl Downstream {
    pub fn forward(client: HttpClient, upstream: impl Into<Arc<str>>) -> Self {
        Downstream::Forward {
            client,
            upstream: upstream.into(),
        }
    }

    pub async fn handle(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        let method = req.method().to_string();
        let response = match self {
            Downstream::NotFound => not_found(req.uri().path()),
            Downstream::Forward { client, upstream } => forward(client, upstream, req).await,
        };
        metrics::record_downstream(&method, response.status().as_u16());
        response
    }
}

pub fn not_found(path: &str) -> Response<Full<Bytes>> {
    debug!("No downstream handler for {}", path);
    JsonResponseBuilder::new(StatusCode::NOT_FOUND)
        .error(format!("No downstream handler for {path}"))
        .build()
}

/// Forward a request to `upstream`, buffering the upstream response body.
async fn forward(
    client: &HttpClient,
    upstream: &str,
    req: Request<Incoming>,
) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let upstream_path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let full_uri = format!("{upstream}{upstream_path}");

    debug!("Forwarding {} to: {}", parts.method, full_uri);

    let mut upstream_req = Request::builder().method(parts.method).uri(&full_uri);

    // Copy headers (skip host)
    for (key, value) in parts.headers.iter() {
        if key != "host" {
            upstream_req = upstream_req.header(key, value);
        }
    }

    let upstream_req = match upstream_req.body(BoxBody::new(body)) {
        Ok(req) => req,
        Err(e) => {
            error!("Failed to build upstream request for {}: {}", full_uri, e);
            return JsonResponseBuilder::new(StatusCode::BAD_GATEWAY)
                .error("Invalid upstream request")
                .build();
        }
    };

    match client.request(upstream_req).await {
        Ok(upstream_response) => {
            let (parts, body) = upstream_response.into_parts();
            match body.collect().await {
                Ok(collected) => Response::from_parts(parts, Full::new(collected.to_bytes())),
                Err(e) => {
                    error!("Failed to collect upstream response body: {}", e);
                    JsonResponseBuilder::new(StatusCode::BAD_GATEWAY)
                        .error("Failed to read upstream response")
                        .build()
                }
            }
        }
        Err(e) => {
            error!("Failed to forward request to upstream: {}", e);
            JsonResponseBuilder::new(StatusCode::BAD_GATEWAY)
                .error("Bad Gateway")
                .build()
        }
    }
}
