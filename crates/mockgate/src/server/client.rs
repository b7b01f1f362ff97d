//! HTTP client used to forward deferred requests upstream.

use http_body_util::combinators::BoxBody;
use hyper::body::Bytes;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;
use tracing::info;

/// Type alias for the HTTP client used for forwarding.
pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, BoxBody<Bytes, hyper::Error>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const KEEPALIVE: Duration = Duration::from_secs(60);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Create a pooled HTTP/1.1 client that speaks both `http` and `https`.
pub fn create_http_client() -> HttpClient {
    let mut http_connector = HttpConnector::new();
    http_connector.set_keepalive(Some(KEEPALIVE));
    http_connector.set_connect_timeout(Some(CONNECT_TIMEOUT));
    http_connector.enforce_http(false); // Allow both HTTP and HTTPS

    let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http_connector);

    let http_client = Client::builder(TokioExecutor::new())
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
        .build(https_connector);

    info!(
        "Upstream client configured (HTTP/1.1): max_idle={}, idle_timeout={}s",
        POOL_MAX_IDLE_PER_HOST,
        POOL_IDLE_TIMEOUT.as_secs()
    );

    http_client
}
