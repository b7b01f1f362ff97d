//! Tower middleware that answers mocked routes in front of a downstream service.
//!
//! For every request the decision is taken synchronously inside
//! [`Service::call`]:
//! - a mocked route yields a future that waits the configured delay on the
//!   tokio timer and then produces the JSON response; the downstream service is
//!   not called;
//! - a route configured for another method calls the downstream service right
//!   away and returns its future;
//! - an unknown or misconfigured route yields an immediate error.
//!
//! Dropping a pending mock response (for example because the client went
//! away) cancels its timer and nothing is written.

use std::task::{Context, Poll};

use bytes::Bytes;
use futures::future::BoxFuture;
use hyper::{Request, Response};
use tower::{BoxError, Layer, Service};
use tracing::{debug, warn};

use crate::dispatcher::{Decision, MockDispatcher, MockResponse};
use crate::metrics;
use crate::response::JsonResponseBuilder;

/// Layer that wraps services with a [`MockService`].
#[derive(Debug, Clone)]
pub struct MockLayer {
    dispatcher: MockDispatcher,
}

impl MockLayer {
    pub fn new(dispatcher: MockDispatcher) -> Self {
        Self { dispatcher }
    }
}

impl<S> Layer<S> for MockLayer {
    type Service = MockService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockService::new(self.dispatcher.clone(), inner)
    }
}

#[derive(Debug, Clone)]
pub struct MockService<S> {
    dispatcher: MockDispatcher,
    inner: S,
}

impl<S> MockService<S> {
    pub fn new(dispatcher: MockDispatcher, inner: S) -> Self {
        Self { dispatcher, inner }
    }

    pub fn dispatcher(&self) -> &MockDispatcher {
        &self.dispatcher
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MockService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: Into<BoxError>,
    S::Future: Send + 'static,
    ResBody: From<Bytes> + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        match self.dispatcher.handle(&req) {
            Ok(Decision::Respond(mock)) => {
                metrics::record_dispatch("mocked");
                Box::pin(respond_after_delay(mock))
            }
            Ok(Decision::Defer) => {
                metrics::record_dispatch("deferred");
                let future = self.inner.call(req);
                Box::pin(async move { future.await.map_err(Into::into) })
            }
            Err(err) => {
                metrics::record_dispatch("fault");
                warn!("{} {}: {}", req.method(), req.uri(), err);
                Box::pin(futures::future::ready(Err(err.into())))
            }
        }
    }
}

/// Marks a mock response that has been scheduled but not yet emitted.
struct PendingMock {
    route: String,
    emitted: bool,
}

impl Drop for PendingMock {
    fn drop(&mut self) {
        if !self.emitted {
            debug!(
                "Pending mock response for {} dropped before its delay elapsed",
                self.route
            );
        }
    }
}

async fn respond_after_delay<B: From<Bytes>>(mock: MockResponse) -> Result<Response<B>, BoxError> {
    let mut pending = PendingMock {
        route: mock.route.clone(),
        emitted: false,
    };

    if !mock.delay.is_zero() {
        tokio::time::sleep(mock.delay).await;
    }

    metrics::record_mocked_response(
        &mock.route,
        mock.status.as_u16(),
        mock.delay.as_millis() as u64,
    );
    pending.emitted = true;

    Ok(JsonResponseBuilder::new(mock.status)
        .json(&mock.body)
        .build())
}
