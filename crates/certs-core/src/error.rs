//! # Error Hierarchy
//!
//! Structured error types for the certificate store, built with `thiserror`.
//!
//! Three failure classes reach callers:
//!
//! - [`ValidationError`]: the request itself is unacceptable, such as a blank
//!   required field or an unconfirmed bulk delete. Never retried.
//! - [`StoreError::NotFound`]: a mutation targeted an id that does not exist.
//! - [`StoreError::Backend`]: the persistence layer failed. The original
//!   cause is kept as the error source and the message names the logical
//!   operation that failed.
//!
//! A lookup that finds nothing is not an error: `get_by_id` returns `None`
//! and `verify` returns an invalid verdict.

use thiserror::Error;

/// Top-level error type for [`crate::CertificateStore`] operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Input rejected before any backend call was made.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The targeted certificate does not exist.
    #[error("certificate not found: {id}")]
    NotFound {
        /// The id that was looked up.
        id: String,
    },

    /// The persistence backend failed while performing `operation`.
    #[error("failed to {operation}: {source}")]
    Backend {
        /// The logical store operation that was in progress.
        operation: Operation,
        /// The underlying backend failure.
        #[source]
        source: BackendError,
    },
}

impl StoreError {
    /// Wrap a backend failure with the operation that triggered it.
    pub fn backend(operation: Operation, source: BackendError) -> Self {
        Self::Backend { operation, source }
    }
}

/// Validation failures for certificate input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or whitespace-only.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A bulk delete was requested without explicit confirmation.
    #[error("clearing all certificates requires explicit confirmation")]
    ConfirmationRequired,
}

/// Logical store operations, used to label backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Save,
    LoadAll,
    LoadByEmail,
    LoadById,
    Search,
    Update,
    Revoke,
    Verify,
    Clear,
    Close,
}

impl Operation {
    /// Human-readable description, phrased to follow "failed to".
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Save => "save certificate",
            Self::LoadAll => "load certificates",
            Self::LoadByEmail => "load certificates by email",
            Self::LoadById => "load certificate",
            Self::Search => "search certificates",
            Self::Update => "update certificate",
            Self::Revoke => "revoke certificate",
            Self::Verify => "verify certificate",
            Self::Clear => "clear certificates",
            Self::Close => "close certificate store",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures raised by a [`crate::CertificateBackend`].
#[derive(Error, Debug)]
pub enum BackendError {
    /// A record with the same id is already stored.
    #[error("certificate id already exists: {0}")]
    Conflict(String),

    /// Local storage could not be read or written.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The database rejected or failed a query.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migrations could not be applied.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_message_names_operation() {
        let err = StoreError::backend(
            Operation::Save,
            BackendError::Conflict("abc".to_string()),
        );
        let msg = err.to_string();
        assert!(msg.starts_with("failed to save certificate"), "got: {msg}");
        assert!(msg.contains("abc"), "got: {msg}");
    }

    #[test]
    fn backend_error_keeps_source() {
        use std::error::Error as _;
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only volume");
        let err = StoreError::backend(Operation::Clear, BackendError::from(io));
        let source = err.source().expect("source is preserved");
        assert!(source.to_string().contains("read-only volume"));
    }

    #[test]
    fn validation_converts_into_store_error() {
        let err: StoreError = ValidationError::MissingField("email").into();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(err.to_string(), "validation error: email is required");
    }

    #[test]
    fn not_found_display() {
        let err = StoreError::NotFound { id: "x1".into() };
        assert_eq!(err.to_string(), "certificate not found: x1");
    }

    #[test]
    fn operation_display_matches_as_str() {
        for op in [
            Operation::Save,
            Operation::LoadAll,
            Operation::LoadByEmail,
            Operation::LoadById,
            Operation::Search,
            Operation::Update,
            Operation::Revoke,
            Operation::Verify,
            Operation::Clear,
            Operation::Close,
        ] {
            assert_eq!(op.to_string(), op.as_str());
        }
    }
}
