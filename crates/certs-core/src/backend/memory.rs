//! In-memory certificate backend.
//!
//! Records live in a `parking_lot::RwLock<HashMap>`. The lock is never held
//! across an `.await`, so synchronous locking is sufficient. Data is lost
//! when the process exits.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::{CertificateBackend, Filter, Order};
use crate::certificate::{Certificate, CertificateId, CertificatePatch};
use crate::error::BackendError;

/// Process-local certificate storage. Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    records: Arc<RwLock<HashMap<CertificateId, Certificate>>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CertificateBackend for MemoryBackend {
    async fn insert(&self, record: Certificate) -> Result<Certificate, BackendError> {
        let mut records = self.records.write();
        if records.contains_key(&record.id) {
            return Err(BackendError::Conflict(record.id.to_string()));
        }
        records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn find_all(
        &self,
        filter: &Filter,
        order: Order,
    ) -> Result<Vec<Certificate>, BackendError> {
        let mut found: Vec<Certificate> = self
            .records
            .read()
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        order.sort(&mut found);
        Ok(found)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Certificate>, BackendError> {
        let records = self.records.read();
        if let Filter::IdEq(id) = filter {
            return Ok(records.get(id).cloned());
        }
        Ok(records.values().find(|c| filter.matches(c)).cloned())
    }

    async fn update_where(
        &self,
        filter: &Filter,
        patch: &CertificatePatch,
        at: DateTime<Utc>,
    ) -> Result<Vec<Certificate>, BackendError> {
        let mut records = self.records.write();
        let mut updated = Vec::new();
        for cert in records.values_mut().filter(|c| filter.matches(c)) {
            cert.apply(patch, at);
            updated.push(cert.clone());
        }
        Ok(updated)
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, BackendError> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|_, c| !filter.matches(c));
        Ok((before - records.len()) as u64)
    }
}
