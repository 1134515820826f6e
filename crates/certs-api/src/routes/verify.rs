//! # Public Verification API
//!
//! The endpoint behind the QR code printed on every certificate. Anyone
//! holding a certificate id can ask whether it is genuine and still valid.
//!
//! ## Endpoints
//!
//! - `GET /v1/verify/:id`
//! - `GET /api/certificates/verify/:id`: path used by existing clients.
//!
//! Both always answer `200` with a verdict. An unknown or revoked id is a
//! negative verdict, not an error.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use certs_core::{Verification, VerificationReport};

use crate::error::AppError;
use crate::state::AppState;

/// Build the verification router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/verify/:id", get(verify_certificate))
        .route("/api/certificates/verify/:id", get(verify_certificate))
}

/// GET /v1/verify/:id: Verify a certificate.
#[utoipa::path(
    get,
    path = "/v1/verify/{id}",
    params(("id" = String, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Verification verdict", body = VerificationReport),
    ),
    tag = "verification"
)]
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VerificationReport>, AppError> {
    let verdict = state.store.verify(&id).await?;
    if let Verification::Invalid(reason) = &verdict {
        tracing::info!(certificate_id = %id, reason = ?reason, "verification failed");
    }
    Ok(Json(verdict.into()))
}
