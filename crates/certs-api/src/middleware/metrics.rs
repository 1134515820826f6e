//! # Prometheus Metrics
//!
//! Request metrics held in a `prometheus::Registry` and exposed at
//! `/metrics` in the text exposition format.
//!
//! Labels use the matched route template (`/v1/certificates/:id`), never the
//! raw path, so certificate ids do not become label values.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::core::Collector;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Label used when no route matched the request.
const UNMATCHED_PATH: &str = "unmatched";

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,
    http_server_errors_total: IntCounter,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .field("server_errors", &self.server_errors())
            .finish()
    }
}

impl ApiMetrics {
    /// Create a new metrics instance with a fresh Prometheus registry.
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("certs_http_requests_total", "Handled HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "certs_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["method", "path"],
        )
        .expect("metric can be created");

        let http_errors_total = IntCounterVec::new(
            Opts::new(
                "certs_http_errors_total",
                "Responses with a 4xx or 5xx status",
            ),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_server_errors_total = IntCounter::new(
            "certs_http_server_errors_total",
            "Responses with a 5xx status",
        )
        .expect("metric can be created");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_request_duration_seconds.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_errors_total.clone()))
            .expect("metric can be registered");
        registry
            .register(Box::new(http_server_errors_total.clone()))
            .expect("metric can be registered");

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                http_server_errors_total,
            }),
        }
    }

    /// Total handled requests, summed across labels.
    pub fn requests(&self) -> u64 {
        sum_counter(&self.inner.http_requests_total)
    }

    /// Total 4xx and 5xx responses, summed across labels.
    pub fn errors(&self) -> u64 {
        sum_counter(&self.inner.http_errors_total)
    }

    /// Total 5xx responses.
    pub fn server_errors(&self) -> u64 {
        self.inner.http_server_errors_total.get()
    }

    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
        if status >= 500 {
            self.inner.http_server_errors_total.inc();
        }
    }

    /// Gather all metrics and encode them in the Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer)
            .map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn sum_counter(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|family| family.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

/// Middleware that records HTTP request metrics.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        let duration = start.elapsed().as_secs_f64();
        m.record_request(&method, &path, response.status().as_u16(), duration);
    }

    response
}
