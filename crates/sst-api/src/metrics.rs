//! Prometheus metrics for the API server.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "sst_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "sst_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "sst_http_requests_in_flight";

    // Event stream metrics
    pub const SSE_STREAMS_TOTAL: &str = "sst_sse_streams_total";
    pub const SSE_STREAMS_ACTIVE: &str = "sst_sse_streams_active";
    pub const SSE_EVENTS_SENT_TOTAL: &str = "sst_sse_events_sent_total";

    // Producer metrics
    pub const PRODUCER_RUNNING: &str = "sst_producer_running";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an event pushed to an SSE client.
pub fn record_sse_event(stream: &'static str) {
    counter!(names::SSE_EVENTS_SENT_TOTAL, "stream" => stream).increment(1);
}

/// Set whether the frame producer is running.
pub fn set_producer_running(running: bool) {
    gauge!(names::PRODUCER_RUNNING).set(if running { 1.0 } else { 0.0 });
}

/// Global counter for open SSE streams.
static ACTIVE_SSE_STREAMS: AtomicI64 = AtomicI64::new(0);

/// Counts one open SSE stream for as long as it is alive.
#[derive(Debug)]
pub struct SseStreamGuard {
    stream: &'static str,
}

impl SseStreamGuard {
    pub fn open(stream: &'static str) -> Self {
        let count = ACTIVE_SSE_STREAMS.fetch_add(1, Ordering::SeqCst) + 1;
        counter!(names::SSE_STREAMS_TOTAL, "stream" => stream).increment(1);
        gauge!(names::SSE_STREAMS_ACTIVE).set(count as f64);
        Self { stream }
    }

}

impl Drop for SseStreamGuard {
    fn drop(&mut self) {
        let count = ACTIVE_SSE_STREAMS.fetch_sub(1, Ordering::SeqCst) - 1;
        gauge!(names::SSE_STREAMS_ACTIVE).set(count as f64);
        debug!(stream = self.stream, active = count, "Event stream closed");
    }
}

/// Metrics middleware for HTTP requests, labelled by route template.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
