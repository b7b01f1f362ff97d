//! Integration tests for the host server: mocked routes, deferral to the
//! downstream handler, upstream forwarding, and fault translation.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};
use mockgate::server::create_listener;
use mockgate::{MockDispatcher, MockServer, ServerConfig};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

type TestClient = Client<HttpConnector, Full<Bytes>>;

fn test_client() -> TestClient {
    Client::builder(TokioExecutor::new()).build_http()
}

fn mocks() -> MockDispatcher {
    MockDispatcher::from_value(json!({
        "routes": {
            "/ping": {"response": {"ok": true}},
            "/item": {"response": {"id": 1}, "method": "post", "status": 201, "delay": 50},
            "/broken": {"method": "GET"}
        }
    }))
    .expect("valid mock configuration")
}

/// Start a mock server on an ephemeral port and return its address.
async fn start_mock_server(upstream: Option<String>) -> SocketAddr {
    let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let config = ServerConfig {
        upstream,
        ..Default::default()
    };
    let server = MockServer::new(config, mocks()).unwrap();
    tokio::spawn(server.serve(listener));
    addr
}

/// Start an upstream that echoes the method and target it received.
async fn start_echo_upstream() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let service = service_fn(|req: Request<Incoming>| async move {
                    let target = req
                        .uri()
                        .path_and_query()
                        .map(|pq| pq.as_str().to_string())
                        .unwrap_or_default();
                    let body = format!("upstream saw {} {}", req.method(), target);
                    Ok::<_, Infallible>(Response::new(Full::new(Bytes::from(body))))
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });

    addr
}

async fn send(client: &TestClient, method: &str, url: String) -> Response<Incoming> {
    let req = Request::builder()
        .method(method)
        .uri(url)
        .body(Full::default())
        .unwrap();
    client.request(req).await.expect("request failed")
}

async fn body_bytes(response: Response<Incoming>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

#[tokio::test]
async fn test_mocked_route_with_defaults() {
    let addr = start_mock_server(None).await;
    let client = test_client();

    let response = send(&client, "GET", format!("http://{addr}/ping")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn test_mocked_route_with_method_status_delay_and_query() {
    let addr = start_mock_server(None).await;
    let client = test_client();

    let start = Instant::now();
    let response = send(&client, "POST", format!("http://{addr}/item?x=1")).await;
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"id": 1}));
}

#[tokio::test]
async fn test_method_mismatch_reaches_downstream() {
    let addr = start_mock_server(None).await;
    let client = test_client();

    let response = send(&client, "GET", format!("http://{addr}/item")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"], "No downstream handler for /item");
}

#[tokio::test]
async fn test_unknown_route_becomes_server_error() {
    let addr = start_mock_server(None).await;
    let client = test_client();

    let response = send(&client, "GET", format!("http://{addr}/unknown")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.headers().get("x-mockgate-error").unwrap(),
        "route-configuration"
    );
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("/unknown"));
}

#[tokio::test]
async fn test_route_without_response_becomes_server_error() {
    let addr = start_mock_server(None).await;
    let client = test_client();

    let response = send(&client, "GET", format!("http://{addr}/broken")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("/broken"));
}

#[tokio::test]
async fn test_deferred_request_is_forwarded_upstream() {
    let upstream = start_echo_upstream().await;
    let addr = start_mock_server(Some(format!("http://{upstream}/"))).await;
    let client = test_client();

    let response = send(&client, "DELETE", format!("http://{addr}/item?id=7")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(response).await,
        Bytes::from_static(b"upstream saw DELETE /item?id=7")
    );

    // Mocked routes never reach the upstream.
    let response = send(&client, "GET", format!("http://{addr}/ping")).await;
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"ok": true}));
}
