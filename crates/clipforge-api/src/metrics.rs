//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "clipforge_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "clipforge_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "clipforge_http_requests_in_flight";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Collapse per-resource path segments so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    let mut out = Vec::new();
    let mut placeholder_next = None;
    for segment in path.split('/') {
        match placeholder_next.take() {
            Some(placeholder) if !segment.is_empty() => out.push(placeholder),
            _ => out.push(segment),
        }
        placeholder_next = match segment {
            "session-history" => Some(":session_id"),
            "videos" => Some(":file_name"),
            _ => None,
        };
    }
    out.join("/")
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/session-history/abc123"),
            "/api/session-history/:session_id"
        );
        assert_eq!(
            sanitize_path("/api/videos/0123abcd.mp4"),
            "/api/videos/:file_name"
        );
        assert_eq!(sanitize_path("/api/list-videos"), "/api/list-videos");
        assert_eq!(sanitize_path("/api/generate-video"), "/api/generate-video");
    }
}
