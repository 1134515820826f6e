//! # Certificate Administration API
//!
//! Issuance, lookup, amendment, revocation, and bulk clear of certificate
//! records.
//!
//! ## Endpoints
//!
//! - `POST   /v1/certificates`: issue a certificate.
//! - `GET    /v1/certificates`: list, or filter by `?email=` / `?name=`.
//! - `DELETE /v1/certificates?confirm=true`: delete every certificate.
//! - `GET    /v1/certificates/:id`: fetch one certificate.
//! - `PATCH  /v1/certificates/:id`: merge a partial update.
//! - `POST   /v1/certificates/:id/revoke`: revoke a certificate.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use certs_core::{Certificate, CertificatePatch, NewCertificate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Response from certificate issuance.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    /// Public verification link, encoded into the certificate's QR code.
    pub verification_url: String,
}

/// Optional lookup filters for the listing endpoint. At most one may be set.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Every certificate issued to this email (case-insensitive), newest first.
    pub email: Option<String>,
    /// Certificates whose recipient name starts with this prefix, by name.
    pub name: Option<String>,
}

/// Confirmation flag for the bulk clear endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClearQuery {
    /// Must be `true`.
    #[serde(default)]
    pub confirm: bool,
}

/// Result of a bulk clear.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearResponse {
    /// Number of certificates deleted.
    pub removed: u64,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the certificates router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/certificates",
            post(issue_certificate)
                .get(list_certificates)
                .delete(clear_certificates),
        )
        .route(
            "/v1/certificates/:id",
            get(get_certificate).patch(update_certificate),
        )
        .route("/v1/certificates/:id/revoke", post(revoke_certificate))
}

fn extract_query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    result
        .map(|Query(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/certificates: Issue a certificate.
///
/// `recipientName`, `email`, and `courseName` are required. The email is
/// stored lowercase and `issueDate` defaults to today (UTC).
#[utoipa::path(
    post,
    path = "/v1/certificates",
    request_body = NewCertificate,
    responses(
        (status = 201, description = "Certificate issued", body = IssuedCertificate),
        (status = 400, description = "Malformed JSON", body = crate::error::ErrorBody),
        (status = 422, description = "Required field missing", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn issue_certificate(
    State(state): State<AppState>,
    body: Result<Json<NewCertificate>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuedCertificate>), AppError> {
    let input = extract_validated_json(body)?;
    let certificate = state.store.create(input).await?;
    let verification_url = state.verification_url(&certificate.id);
    Ok((
        StatusCode::CREATED,
        Json(IssuedCertificate {
            certificate,
            verification_url,
        }),
    ))
}

/// GET /v1/certificates: List or look up certificates.
///
/// With `?email=`, returns that recipient's certificates newest first.
/// With `?name=`, returns prefix matches ordered by name. With neither,
/// returns every certificate newest first.
#[utoipa::path(
    get,
    path = "/v1/certificates",
    params(ListQuery),
    responses(
        (status = 200, description = "Matching certificates", body = [Certificate]),
        (status = 400, description = "Both email and name supplied", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn list_certificates(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Certificate>>, AppError> {
    let found = match extract_query(query)? {
        ListQuery {
            email: Some(_),
            name: Some(_),
        } => {
            return Err(AppError::BadRequest(
                "email and name filters cannot be combined".to_string(),
            ))
        }
        ListQuery {
            email: Some(email),
            ..
        } => state.store.get_by_email(&email).await?,
        ListQuery {
            name: Some(name), ..
        } => state.store.search_by_name(&name).await?,
        ListQuery { .. } => state.store.list_all().await?,
    };
    Ok(Json(found))
}

/// GET /v1/certificates/:id: Fetch one certificate.
#[utoipa::path(
    get,
    path = "/v1/certificates/{id}",
    params(("id" = String, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Certificate found", body = Certificate),
        (status = 404, description = "Certificate not found", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Certificate>, AppError> {
    state
        .store
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("certificate {id} not found")))
}

/// PATCH /v1/certificates/:id: Merge a partial update.
///
/// Absent fields are left untouched and present ones are stored as given;
/// the only check is that the certificate exists. `isRevoked: true`
/// revokes; a revoked certificate cannot be reinstated.
#[utoipa::path(
    patch,
    path = "/v1/certificates/{id}",
    params(("id" = String, Path, description = "Certificate ID")),
    request_body = CertificatePatch,
    responses(
        (status = 200, description = "Updated certificate", body = Certificate),
        (status = 404, description = "Certificate not found", body = crate::error::ErrorBody),
        (status = 400, description = "Malformed JSON", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn update_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<CertificatePatch>, JsonRejection>,
) -> Result<Json<Certificate>, AppError> {
    let patch = extract_json(body)?;
    let updated = state.store.update(&id, patch).await?;
    Ok(Json(updated))
}

/// POST /v1/certificates/:id/revoke: Revoke a certificate.
///
/// Idempotent: revoking an already revoked certificate succeeds.
#[utoipa::path(
    post,
    path = "/v1/certificates/{id}/revoke",
    params(("id" = String, Path, description = "Certificate ID")),
    responses(
        (status = 200, description = "Revoked certificate", body = Certificate),
        (status = 404, description = "Certificate not found", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn revoke_certificate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Certificate>, AppError> {
    let revoked = state.store.revoke(&id).await?;
    Ok(Json(revoked))
}

/// DELETE /v1/certificates?confirm=true: Delete every certificate.
///
/// Disabled unless the server runs with `CERTS_ALLOW_CLEAR=true`, and
/// requires `confirm=true` on every call.
#[utoipa::path(
    delete,
    path = "/v1/certificates",
    params(ClearQuery),
    responses(
        (status = 200, description = "All certificates deleted", body = ClearResponse),
        (status = 403, description = "Bulk clear disabled", body = crate::error::ErrorBody),
        (status = 422, description = "Confirmation missing", body = crate::error::ErrorBody),
    ),
    tag = "certificates"
)]
pub async fn clear_certificates(
    State(state): State<AppState>,
    query: Result<Query<ClearQuery>, QueryRejection>,
) -> Result<Json<ClearResponse>, AppError> {
    let query = extract_query(query)?;
    if !state.config.allow_clear {
        tracing::warn!("bulk clear rejected: disabled by configuration");
        return Err(AppError::Forbidden(
            "clearing certificates is disabled on this server".to_string(),
        ));
    }
    let removed = state.store.clear_all(query.confirm).await?;
    Ok(Json(ClearResponse { removed }))
}
