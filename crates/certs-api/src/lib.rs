//! # certs-api: HTTP Service for Participation Certificates
//!
//! Exposes the [`certs_core::CertificateStore`] over HTTP: administrative
//! issuance and revocation, and the public verification endpoint that the
//! QR code on every printed certificate points to.
//!
//! ## API Surface
//!
//! | Prefix                          | Module                    |
//! |---------------------------------|---------------------------|
//! | `/v1/certificates*`             | [`routes::certificates`]  |
//! | `/v1/verify/*`                  | [`routes::verify`]        |
//! | `/api/certificates/verify/*`    | [`routes::verify`]        |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → body limit (1 MiB) → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Generated via utoipa derive macros, served at `/openapi.json`.

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Maximum accepted request body size.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes and `/metrics` sit outside the metrics middleware so
/// scrapes and probes do not inflate the request counters.
pub fn app(state: AppState) -> Router {
    let metrics = state.metrics.clone();

    let api = Router::new()
        .merge(routes::certificates::router())
        .merge(routes::verify::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(metrics))
        .with_state(state.clone());

    let ops = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .route("/metrics", get(metrics_text))
        .with_state(state);

    Router::new().merge(ops).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: the store is opened before the listener binds, so a
/// serving process is ready.
async fn readiness() -> &'static str {
    "ready"
}

/// GET /metrics: request metrics in Prometheus text format.
async fn metrics_text(State(state): State<AppState>) -> Response {
    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to encode Prometheus metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e).into_response()
        }
    }
}
