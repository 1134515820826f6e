//! # Certificate Store
//!
//! The one component that owns certificate issuance, lookup, revocation,
//! and verification. Persistence is delegated to an injected
//! [`CertificateBackend`]; the store adds validation, normalization,
//! identifier generation, ordering, and error labelling.
//!
//! Every backend failure is returned as [`StoreError::Backend`] naming the
//! logical operation that failed. Nothing is swallowed.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::backend::{CertificateBackend, Filter, Order};
use crate::certificate::{
    normalize_email, now, Certificate, CertificateId, CertificatePatch, NewCertificate,
};
use crate::error::{Operation, StoreError, ValidationError};

/// Why a certificate failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// No certificate has this id.
    NotFound,
    /// The certificate exists but has been revoked.
    Revoked,
}

impl InvalidReason {
    /// User-facing explanation.
    pub fn message(&self) -> &'static str {
        match self {
            Self::NotFound => "No certificate exists with this ID",
            Self::Revoked => "This certificate has been revoked",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of [`CertificateStore::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The certificate exists and is not revoked.
    Valid(Certificate),
    /// The certificate must not be trusted.
    Invalid(InvalidReason),
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Serializable form of a [`Verification`], shared by every surface that
/// reports a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    /// `true` iff the certificate exists and has not been revoked.
    pub valid: bool,
    /// The certificate, present only when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
    /// Why verification failed, present only when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<InvalidReason>,
    /// Human-readable explanation, present only when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Verification> for VerificationReport {
    fn from(verdict: Verification) -> Self {
        match verdict {
            Verification::Valid(certificate) => Self {
                valid: true,
                certificate: Some(certificate),
                reason: None,
                message: None,
            },
            Verification::Invalid(reason) => Self {
                valid: false,
                certificate: None,
                reason: Some(reason),
                message: Some(reason.message().to_string()),
            },
        }
    }
}

/// Certificate issuance, lookup, and verification over a pluggable backend.
///
/// Cheap to clone; clones share the backend.
#[derive(Debug, Clone)]
pub struct CertificateStore {
    backend: Arc<dyn CertificateBackend>,
}

impl CertificateStore {
    /// Build a store over an opened backend.
    pub fn new(backend: Arc<dyn CertificateBackend>) -> Self {
        Self { backend }
    }

    /// A store over a fresh in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(crate::backend::MemoryBackend::new()))
    }

    /// Issue a new certificate.
    ///
    /// Validates required fields, assigns a fresh id and timestamps,
    /// lowercases the email, and persists exactly one record.
    pub async fn create(&self, input: NewCertificate) -> Result<Certificate, StoreError> {
        input.validate()?;
        let record = input.into_certificate(CertificateId::generate(), now());
        let stored = self
            .backend
            .insert(record)
            .await
            .map_err(|e| StoreError::backend(Operation::Save, e))?;
        tracing::info!(certificate_id = %stored.id, "certificate issued");
        Ok(stored)
    }

    /// Exact-match lookup. `Ok(None)` when no certificate has this id.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Certificate>, StoreError> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        self.find_by_id(id, Operation::LoadById).await
    }

    /// Every certificate issued to `email` (case-insensitive), newest first.
    pub async fn get_by_email(&self, email: &str) -> Result<Vec<Certificate>, StoreError> {
        let email = normalize_email(email);
        let found = self
            .backend
            .find_all(&Filter::EmailEq(email), Order::CreatedAtDesc)
            .await
            .map_err(|e| StoreError::backend(Operation::LoadByEmail, e))?;
        tracing::debug!(count = found.len(), "loaded certificates by email");
        Ok(found)
    }

    /// Certificates whose recipient name starts with `prefix`, by name.
    ///
    /// Prefix match only; case and whitespace in `prefix` are significant.
    pub async fn search_by_name(&self, prefix: &str) -> Result<Vec<Certificate>, StoreError> {
        let found = self
            .backend
            .find_all(&Filter::NamePrefix(prefix.to_string()), Order::RecipientNameAsc)
            .await
            .map_err(|e| StoreError::backend(Operation::Search, e))?;
        tracing::debug!(count = found.len(), "searched certificates by name");
        Ok(found)
    }

    /// Every certificate, newest first. Intended for administration.
    pub async fn list_all(&self) -> Result<Vec<Certificate>, StoreError> {
        self.backend
            .find_all(&Filter::All, Order::CreatedAtDesc)
            .await
            .map_err(|e| StoreError::backend(Operation::LoadAll, e))
    }

    /// Merge `patch` into the certificate with this id.
    ///
    /// The backend applies the patch atomically. The only check is that the
    /// record exists: [`StoreError::NotFound`] when no record matched.
    pub async fn update(
        &self,
        id: &str,
        patch: CertificatePatch,
    ) -> Result<Certificate, StoreError> {
        let updated = self
            .apply_patch(id, patch.normalized(), Operation::Update)
            .await?;
        tracing::info!(certificate_id = %updated.id, "certificate updated");
        Ok(updated)
    }

    /// Revoke a certificate. Revoking twice succeeds.
    pub async fn revoke(&self, id: &str) -> Result<Certificate, StoreError> {
        let revoked = self
            .apply_patch(id, CertificatePatch::revoke(), Operation::Revoke)
            .await?;
        tracing::info!(certificate_id = %revoked.id, "certificate revoked");
        Ok(revoked)
    }

    /// The verification predicate: valid iff the record exists and is not
    /// revoked. Not-found and revoked are reported separately.
    pub async fn verify(&self, id: &str) -> Result<Verification, StoreError> {
        if id.trim().is_empty() {
            return Ok(Verification::Invalid(InvalidReason::NotFound));
        }
        let verdict = match self.find_by_id(id, Operation::Verify).await? {
            None => Verification::Invalid(InvalidReason::NotFound),
            Some(cert) if cert.is_revoked => Verification::Invalid(InvalidReason::Revoked),
            Some(cert) => Verification::Valid(cert),
        };
        tracing::debug!(certificate_id = %id, valid = verdict.is_valid(), "certificate verified");
        Ok(verdict)
    }

    /// Delete every certificate. Irreversible and unscoped, so `confirm`
    /// must be `true`. Returns the number of records removed.
    pub async fn clear_all(&self, confirm: bool) -> Result<u64, StoreError> {
        if !confirm {
            tracing::warn!("refusing to clear certificates without confirmation");
            return Err(ValidationError::ConfirmationRequired.into());
        }
        let removed = self
            .backend
            .delete_all()
            .await
            .map_err(|e| StoreError::backend(Operation::Clear, e))?;
        tracing::warn!(count = removed, "all certificates cleared");
        Ok(removed)
    }

    /// Release the backend.
    pub async fn close(&self) -> Result<(), StoreError> {
        self.backend
            .close()
            .await
            .map_err(|e| StoreError::backend(Operation::Close, e))
    }

    async fn find_by_id(
        &self,
        id: &str,
        operation: Operation,
    ) -> Result<Option<Certificate>, StoreError> {
        self.backend
            .find_one(&Filter::IdEq(CertificateId::new(id)))
            .await
            .map_err(|e| StoreError::backend(operation, e))
    }

    async fn apply_patch(
        &self,
        id: &str,
        patch: CertificatePatch,
        operation: Operation,
    ) -> Result<Certificate, StoreError> {
        let updated = self
            .backend
            .update_where(&Filter::IdEq(CertificateId::new(id)), &patch, now())
            .await
            .map_err(|e| StoreError::backend(operation, e))?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }
}
