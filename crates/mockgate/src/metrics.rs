//! Prometheus metrics for mockgate.
//!
//! Tracks dispatch outcomes, injected delays, and downstream traffic.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    /// Dispatch decisions by outcome
    pub static ref DISPATCH_TOTAL: CounterVec = register_counter_vec!(
        "mockgate_dispatch_total",
        "Total number of requests seen by the mock middleware",
        &["outcome"]  // outcome: mocked|deferred|fault
    )
    .expect("mockgate_dispatch_total registers once");

    /// Mocked responses by route and status
    pub static ref MOCKED_RESPONSES_TOTAL: CounterVec = register_counter_vec!(
        "mockgate_mocked_responses_total",
        "Total number of mocked responses emitted",
        &["route", "status"]
    )
    .expect("mockgate_mocked_responses_total registers once");

    /// Configured delay applied before mocked responses
    pub static ref MOCK_DELAY_MS: HistogramVec = register_histogram_vec!(
        "mockgate_mock_delay_ms",
        "Histogram of configured mock delays in milliseconds",
        &["route"],
        vec![0.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .expect("mockgate_mock_delay_ms registers once");

    /// Downstream (upstream forwarding or not-found) responses
    pub static ref DOWNSTREAM_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "mockgate_downstream_requests_total",
        "Total number of requests handled by the downstream service",
        &["method", "status"]
    )
    .expect("mockgate_downstream_requests_total registers once");
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

pub fn record_dispatch(outcome: &str) {
    DISPATCH_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_mocked_response(route: &str, status: u16, delay_ms: u64) {
    MOCKED_RESPONSES_TOTAL
        .with_label_values(&[route, &status.to_string()])
        .inc();
    MOCK_DELAY_MS
        .with_label_values(&[route])
        .observe(delay_ms as f64);
}

pub fn record_downstream(method: &str, status: u16) {
    DOWNSTREAM_REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
}
