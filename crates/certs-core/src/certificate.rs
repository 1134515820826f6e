//! # Certificate Records
//!
//! The sole entity of the service: a record asserting that a named recipient
//! completed a named course or program on a given date.
//!
//! ## Wire Format
//!
//! Records serialize in camelCase (`recipientName`, `isRevoked`, ...) so that
//! the JSON shape matches what the certificate and verification views read.
//! Timestamps are RFC 3339 UTC with millisecond precision; `issueDate` is a
//! plain calendar date.
//!
//! ## Invariants
//!
//! - `id` is assigned once at creation and never changes.
//! - `email` is always stored lowercase (see [`normalize_email`]).
//! - `isRevoked` only ever moves from `false` to `true`.

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Identifier
// ---------------------------------------------------------------------------

/// Opaque, globally unique certificate identifier.
///
/// Freshly issued ids are random UUID v4 values (122 bits of entropy), so
/// they carry no creation-time ordering and cannot be guessed from a
/// neighbouring id. Ids supplied by callers are accepted verbatim, which
/// keeps identifiers issued by earlier systems valid as lookup keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(String);

impl CertificateId {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CertificateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for CertificateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CertificateId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Normalize an email address for storage and comparison.
///
/// Email comparisons are case-insensitive; the stored form is trimmed and
/// lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Build the public verification URL for a certificate.
///
/// This is the URL encoded into the QR code of the printable certificate.
pub fn verification_url(base_url: &str, id: &CertificateId) -> String {
    format!("{}/verify/{}", base_url.trim_end_matches('/'), id)
}

/// Current UTC time at the precision stored in records.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Treat a blank optional string as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

// ---------------------------------------------------------------------------
// Certificate
// ---------------------------------------------------------------------------

/// A persisted participation certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Public verification key.
    #[schema(value_type = String)]
    pub id: CertificateId,
    pub recipient_name: String,
    /// Always lowercase.
    pub email: String,
    /// The achievement or program label.
    pub course_name: String,
    pub issue_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub is_revoked: bool,
}

impl Certificate {
    /// Merge a partial update into this record and stamp `updated_at`.
    ///
    /// `isRevoked` is OR-ed in: a patch may revoke but never reinstate.
    pub fn apply(&mut self, patch: &CertificatePatch, at: DateTime<Utc>) {
        if let Some(name) = &patch.recipient_name {
            self.recipient_name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = normalize_email(email);
        }
        if let Some(course) = &patch.course_name {
            self.course_name = course.clone();
        }
        if let Some(date) = patch.issue_date {
            self.issue_date = date;
        }
        if let Some(instructor) = &patch.instructor_name {
            self.instructor_name = Some(instructor.clone());
        }
        if let Some(organization) = &patch.organization {
            self.organization = Some(organization.clone());
        }
        if patch.is_revoked == Some(true) {
            self.is_revoked = true;
        }
        self.updated_at = at;
    }

    /// File name stem used when exporting the rendered certificate.
    ///
    /// Each whitespace run in the recipient name becomes a single `_`,
    /// e.g. `certificate_Ada_Lovelace`.
    pub fn export_file_stem(&self) -> String {
        let mut stem = String::from("certificate_");
        let mut in_space = false;
        for c in self.recipient_name.chars() {
            if c.is_whitespace() {
                if !in_space {
                    stem.push('_');
                }
                in_space = true;
            } else {
                stem.push(c);
                in_space = false;
            }
        }
        stem
    }
}

/// Input for issuing a new certificate.
///
/// All fields default when absent from JSON so that a missing field is
/// reported as a validation failure rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCertificate {
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub course_name: String,
    /// Defaults to the UTC day of issuance.
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub instructor_name: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

impl NewCertificate {
    /// Convenience constructor with the three required fields.
    pub fn new(
        recipient_name: impl Into<String>,
        email: impl Into<String>,
        course_name: impl Into<String>,
    ) -> Self {
        Self {
            recipient_name: recipient_name.into(),
            email: email.into(),
            course_name: course_name.into(),
            ..Self::default()
        }
    }

    /// Check that every required field carries a non-blank value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.email) {
            return Err(ValidationError::MissingField("email"));
        }
        if is_blank(&self.course_name) {
            return Err(ValidationError::MissingField("courseName"));
        }
        if is_blank(&self.recipient_name) {
            return Err(ValidationError::MissingField("recipientName"));
        }
        Ok(())
    }

    /// Build the record that will be persisted.
    ///
    /// Does not validate; callers run [`NewCertificate::validate`] first.
    pub fn into_certificate(self, id: CertificateId, at: DateTime<Utc>) -> Certificate {
        Certificate {
            id,
            recipient_name: self.recipient_name,
            email: normalize_email(&self.email),
            course_name: self.course_name,
            issue_date: self.issue_date.unwrap_or_else(|| at.date_naive()),
            instructor_name: non_blank(self.instructor_name),
            organization: non_blank(self.organization),
            created_at: at,
            updated_at: at,
            is_revoked: false,
        }
    }
}

/// Partial update to a stored certificate.
///
/// Absent fields are left untouched. Optional fields can be set but not
/// cleared. Values are stored as given: only the target's existence is
/// checked, so a patch may set a required field to an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificatePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// `true` revokes; `false` is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_revoked: Option<bool>,
}

impl CertificatePatch {
    /// The patch applied by a revocation.
    pub fn revoke() -> Self {
        Self {
            is_revoked: Some(true),
            ..Self::default()
        }
    }

    /// Lowercase the email, if present, so backends store the normalized form.
    pub fn normalized(mut self) -> Self {
        if let Some(email) = self.email.take() {
            self.email = Some(normalize_email(&email));
        }
        self
    }

    /// Whether the patch revokes the certificate.
    pub fn revokes(&self) -> bool {
        self.is_revoked == Some(true)
    }
}
