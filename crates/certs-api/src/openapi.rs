//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Certificates API",
        version = "0.1.0",
        description = "Issuance, lookup, revocation, and public verification of participation certificates.",
        license(name = "BUSL-1.1")
    ),
    paths(
        crate::routes::certificates::issue_certificate,
        crate::routes::certificates::list_certificates,
        crate::routes::certificates::get_certificate,
        crate::routes::certificates::update_certificate,
        crate::routes::certificates::revoke_certificate,
        crate::routes::certificates::clear_certificates,
        crate::routes::verify::verify_certificate,
    ),
    components(schemas(
        certs_core::Certificate,
        certs_core::NewCertificate,
        certs_core::CertificatePatch,
        certs_core::InvalidReason,
        crate::routes::certificates::IssuedCertificate,
        crate::routes::certificates::ClearResponse,
        certs_core::VerificationReport,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "certificates", description = "Certificate administration"),
        (name = "verification", description = "Public certificate verification"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
