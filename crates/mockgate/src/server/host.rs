//! MockServer struct and main run loop.
//!
//! Every connection is served by the mock middleware layered over the
//! downstream handler. Faults raised by the middleware are turned into JSON
//! 500 responses here, since the middleware itself never translates them.

use super::client::create_http_client;
use super::downstream::Downstream;
use super::network::create_listener;
use crate::config::ServerConfig;
use crate::dispatcher::MockDispatcher;
use crate::error::RouteConfigurationError;
use crate::metrics::collect_metrics;
use crate::middleware::MockLayer;
use crate::response::JsonResponseBuilder;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tower::{BoxError, ServiceBuilder, ServiceExt};
use tracing::{debug, error, info};

pub struct MockServer {
    config: ServerConfig,
    dispatcher: MockDispatcher,
    downstream: Downstream,
}

impl MockServer {
    pub fn new(config: ServerConfig, dispatcher: MockDispatcher) -> Result<Self, anyhow::Error> {
        config.validate()?;

        let downstream = match config.upstream_base() {
            Some(upstream) => Downstream::forward(create_http_client(), upstream),
            None => Downstream::NotFound,
        };

        Ok(Self {
            config,
            dispatcher,
            downstream,
        })
    }

    /// Resolve the configured listen host. IP literals (v4 or v6) are used as
    /// is; anything else is looked up and the first address wins.
    pub async fn listen_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        let host = self.config.listen.host.as_str();
        let port = self.config.listen.port;

        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, port));
        }

        tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| anyhow::anyhow!("Failed to resolve listen host '{host}': {e}"))?
            .next()
            .ok_or_else(|| anyhow::anyhow!("Listen host '{host}' resolved to no addresses"))
    }

    /// Bind the configured address (and metrics port, if any) and serve until
    /// an accept error occurs.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let addr = self.listen_addr().await?;
        let listener = create_listener(addr)?;

        if let Some(metrics_port) = self.config.metrics.port {
            let metrics_addr = SocketAddr::new(addr.ip(), metrics_port);
            let metrics_listener = create_listener(metrics_addr)?;
            info!("Metrics available on http://{}/metrics", metrics_addr);
            tokio::spawn(async move {
                if let Err(e) = serve_metrics(metrics_listener).await {
                    error!("Metrics server stopped: {}", e);
                }
            });
        }

        self.serve(listener).await
    }

    /// Serve connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), anyhow::Error> {
        info!("Listening on http://{}", listener.local_addr()?);
        info!("Loaded {} mock route(s)", self.dispatcher.route_count());
        match self.config.upstream_base() {
            Some(upstream) => info!("Deferred requests are forwarded to {}", upstream),
            None => info!("No upstream configured, deferred requests receive 404"),
        }

        let downstream = self.downstream.clone();
        let downstream = tower::service_fn(move |req: Request<Incoming>| {
            let downstream = downstream.clone();
            async move { Ok::<_, Infallible>(downstream.handle(req).await) }
        });
        let service = ServiceBuilder::new()
            .layer(MockLayer::new(self.dispatcher.clone()))
            .service(downstream);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let service = service.clone();

            tokio::spawn(async move {
                let io = TokioIo::new(stream);
                let hyper_service = service_fn(move |req: Request<Incoming>| {
                    let service = service.clone();
                    async move {
                        let response = match service.oneshot(req).await {
                            Ok(response) => response,
                            Err(err) => fault_response(err),
                        };
                        Ok::<_, Infallible>(response)
                    }
                });

                if let Err(err) = http1::Builder::new()
                    .serve_connection(io, hyper_service)
                    .await
                {
                    error!(
                        "Error serving HTTP connection from {}: {}",
                        remote_addr, err
                    );
                }
            });
        }
    }
}

/// Convert a middleware fault into a client-visible response.
fn fault_response(err: BoxError) -> Response<Full<Bytes>> {
    match err.downcast_ref::<RouteConfigurationError>() {
        Some(route_err) => JsonResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
            .header("x-mockgate-error", "route-configuration")
            .error(route_err.to_string())
            .build(),
        None => {
            error!("Request failed: {}", err);
            JsonResponseBuilder::new(StatusCode::INTERNAL_SERVER_ERROR)
                .error(err.to_string())
                .build()
        }
    }
}

async fn serve_metrics(listener: TcpListener) -> Result<(), anyhow::Error> {
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            let service = service_fn(|req: Request<Incoming>| async move {
                Ok::<_, Infallible>(metrics_response(&req))
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Metrics connection error: {}", e);
            }
        });
    }
}

fn metrics_response<B>(req: &Request<B>) -> Response<Full<Bytes>> {
    if req.method() == Method::GET && req.uri().path() == "/metrics" {
        let mut response = Response::new(Full::new(Bytes::from(collect_metrics())));
        response.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("text/plain; version=0.0.4"),
        );
        response
    } else {
        JsonResponseBuilder::new(StatusCode::NOT_FOUND)
            .error("Not found")
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_fault_response_for_route_error() {
        let err: BoxError = Box::new(RouteConfigurationError::Unmatched {
            route: "/unknown".to_string(),
        });
        let response = fault_response(err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.headers().get("x-mockgate-error").unwrap(),
            "route-configuration"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("/unknown"));
    }

    #[test]
    fn test_metrics_response_routes() {
        let req = Request::get("/metrics").body(()).unwrap();
        assert_eq!(metrics_response(&req).status(), StatusCode::OK);

        let req = Request::get("/other").body(()).unwrap();
        assert_eq!(metrics_response(&req).status(), StatusCode::NOT_FOUND);
    }

    fn server_on(host: &str, port: u16) -> MockServer {
        let dispatcher = MockDispatcher::from_value(
            serde_json::json!({"routes": {"/ping": {"response": "pong"}}}),
        )
        .unwrap();
        let mut config = ServerConfig::default();
        config.listen.host = host.to_string();
        config.listen.port = port;
        MockServer::new(config, dispatcher).unwrap()
    }

    #[tokio::test]
    async fn test_listen_addr_ip_literals() {
        assert_eq!(
            server_on("127.0.0.1", 9000).listen_addr().await.unwrap(),
            "127.0.0.1:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            server_on("::1", 9000).listen_addr().await.unwrap(),
            "[::1]:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            server_on("::", 8080).listen_addr().await.unwrap(),
            "[::]:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_listen_addr_resolves_host_names() {
        let addr = server_on("localhost", 9000).listen_addr().await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 9000);
    }

    #[tokio::test]
    async fn test_listen_addr_unresolvable_host() {
        let err = server_on("no-such-host.invalid", 9000)
            .listen_addr()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no-such-host.invalid"));
    }
}
