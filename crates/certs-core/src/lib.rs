//! # certs-core: Participation Certificate Records
//!
//! The data-integrity core of the certificate service. Everything the
//! presentation layer renders (the printable certificate, its QR code, the
//! verification page) is derived from the records managed here.
//!
//! ## Modules
//!
//! - [`certificate`]: the [`Certificate`] record, creation input, partial
//!   updates, and the identifier newtype.
//! - [`backend`]: the [`CertificateBackend`] persistence trait and its
//!   memory, JSON-file, and PostgreSQL implementations.
//! - [`store`]: [`CertificateStore`], the single component that creates,
//!   looks up, revokes, and verifies certificates.
//! - [`error`]: structured error hierarchy.
//!
//! ## Validity
//!
//! A certificate is valid for verification purposes if and only if a record
//! with its id exists in the backend and `isRevoked` is false. Revocation is
//! one-way: no operation in this crate flips `isRevoked` back to false.

pub mod backend;
pub mod certificate;
pub mod error;
pub mod store;

pub use backend::{open_backend, BackendConfig, CertificateBackend, Filter, Order};
pub use certificate::{
    normalize_email, verification_url, Certificate, CertificateId, CertificatePatch,
    NewCertificate,
};
pub use error::{BackendError, Operation, StoreError, ValidationError};
pub use store::{CertificateStore, InvalidReason, Verification, VerificationReport};
