//! # Persistence Backends
//!
//! Trait-based abstraction over certificate persistence so that one
//! [`crate::CertificateStore`] serves every deployment:
//!
//! - [`MemoryBackend`]: process-local maps, for tests and development.
//! - [`FileBackend`]: the whole collection in one JSON document on disk.
//! - [`PgBackend`]: a `certificates` table in PostgreSQL, shared between
//!   instances.
//!
//! Backends are constructed explicitly through [`open_backend`] and closed
//! through [`CertificateBackend::close`]. There is no process-global handle.
//!
//! ## Atomic updates
//!
//! [`CertificateBackend::update_where`] applies a patch to each matching
//! record in one step (a single lock acquisition or a single SQL
//! statement). Concurrent revocations of the same id cannot interleave a
//! stale read with a write.

pub mod file;
pub mod memory;
pub mod postgres;

pub use file::FileBackend;
pub use memory::MemoryBackend;
pub use postgres::PgBackend;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::certificate::{Certificate, CertificateId, CertificatePatch};
use crate::error::BackendError;

/// Record selector understood by every backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Every record.
    All,
    /// Exact id match.
    IdEq(CertificateId),
    /// Exact match on the (already normalized) email.
    EmailEq(String),
    /// Recipient names starting with the given prefix, compared byte-wise.
    NamePrefix(String),
}

impl Filter {
    /// Whether `cert` is selected by this filter.
    pub fn matches(&self, cert: &Certificate) -> bool {
        match self {
            Self::All => true,
            Self::IdEq(id) => &cert.id == id,
            Self::EmailEq(email) => &cert.email == email,
            Self::NamePrefix(prefix) => cert.recipient_name.starts_with(prefix.as_str()),
        }
    }
}

/// Result ordering for [`CertificateBackend::find_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Backend-native order.
    Unordered,
    /// Most recently created first; ties broken by id.
    CreatedAtDesc,
    /// Recipient name ascending by code point; ties broken by creation
    /// time, then id.
    RecipientNameAsc,
}

impl Order {
    /// Sort a slice of records in place.
    pub fn sort(&self, records: &mut [Certificate]) {
        match self {
            Self::Unordered => {}
            Self::CreatedAtDesc => records.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            }),
            Self::RecipientNameAsc => records.sort_by(|a, b| {
                a.recipient_name
                    .cmp(&b.recipient_name)
                    .then_with(|| a.created_at.cmp(&b.created_at))
                    .then_with(|| a.id.cmp(&b.id))
            }),
        }
    }
}

/// Storage capability set required by the certificate store.
///
/// Implementations must be thread-safe; every method is a single
/// request/response round trip and either fully succeeds or returns a
/// [`BackendError`].
#[async_trait]
pub trait CertificateBackend: Send + Sync + std::fmt::Debug {
    /// Persist a new record. Fails with [`BackendError::Conflict`] if the
    /// id is already present.
    async fn insert(&self, record: Certificate) -> Result<Certificate, BackendError>;

    /// All records selected by `filter`, in `order`.
    async fn find_all(&self, filter: &Filter, order: Order)
        -> Result<Vec<Certificate>, BackendError>;

    /// The first record selected by `filter`, if any.
    async fn find_one(&self, filter: &Filter) -> Result<Option<Certificate>, BackendError>;

    /// Apply `patch` to every record selected by `filter`, stamping
    /// `updated_at = at`. Returns the updated records.
    async fn update_where(
        &self,
        filter: &Filter,
        patch: &CertificatePatch,
        at: DateTime<Utc>,
    ) -> Result<Vec<Certificate>, BackendError>;

    /// Delete every record selected by `filter`. Returns the number removed.
    async fn delete_where(&self, filter: &Filter) -> Result<u64, BackendError>;

    /// Delete every record. Returns the number removed.
    async fn delete_all(&self) -> Result<u64, BackendError> {
        self.delete_where(&Filter::All).await
    }

    /// Release held resources. Further calls after `close` may fail.
    async fn close(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Which backend to open, and how.
#[derive(Clone, PartialEq, Eq)]
pub enum BackendConfig {
    Memory,
    File { path: PathBuf },
    Postgres { url: String, max_connections: u32 },
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::File { path } => f.debug_struct("File").field("path", path).finish(),
            // Connection strings carry credentials.
            Self::Postgres {
                max_connections, ..
            } => f
                .debug_struct("Postgres")
                .field("url", &"[REDACTED]")
                .field("max_connections", max_connections)
                .finish(),
        }
    }
}

impl BackendConfig {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File { .. } => "file",
            Self::Postgres { .. } => "postgres",
        }
    }
}

/// Open the configured backend.
///
/// PostgreSQL connections are established and migrated here, so a
/// misconfigured database fails at startup rather than on first use.
pub async fn open_backend(
    config: &BackendConfig,
) -> Result<Arc<dyn CertificateBackend>, BackendError> {
    let backend: Arc<dyn CertificateBackend> = match config {
        BackendConfig::Memory => Arc::new(MemoryBackend::new()),
        BackendConfig::File { path } => Arc::new(FileBackend::new(path.clone())),
        BackendConfig::Postgres {
            url,
            max_connections,
        } => Arc::new(PgBackend::connect(url, *max_connections).await?),
    };
    tracing::info!(backend = config.kind(), "certificate backend opened");
    Ok(backend)
}
