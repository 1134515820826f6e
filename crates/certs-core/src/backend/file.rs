//! JSON file certificate backend.
//!
//! The whole collection is one JSON document, `{"certificates": [...]}`,
//! stored at a single path. Every operation takes an async mutex, reads the
//! document, and for writes replaces it by writing a sibling temporary file
//! and renaming it over the original. A reader never observes a partially
//! written document, and two writers in the same process never interleave.
//!
//! A missing file is an empty collection.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::{CertificateBackend, Filter, Order};
use crate::certificate::{Certificate, CertificatePatch};
use crate::error::BackendError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    certificates: Vec<Certificate>,
}

/// Certificate storage in a local JSON file.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileBackend {
    /// Use the document at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Document, BackendError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Document::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, doc: &Document) -> Result<(), BackendError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(doc)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CertificateBackend for FileBackend {
    async fn insert(&self, record: Certificate) -> Result<Certificate, BackendError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        if doc.certificates.iter().any(|c| c.id == record.id) {
            return Err(BackendError::Conflict(record.id.to_string()));
        }
        doc.certificates.push(record.clone());
        self.save(&doc).await?;
        Ok(record)
    }

    async fn find_all(
        &self,
        filter: &Filter,
        order: Order,
    ) -> Result<Vec<Certificate>, BackendError> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        let mut found: Vec<Certificate> = doc
            .certificates
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect();
        order.sort(&mut found);
        Ok(found)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Certificate>, BackendError> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        Ok(doc.certificates.into_iter().find(|c| filter.matches(c)))
    }

    async fn update_where(
        &self,
        filter: &Filter,
        patch: &CertificatePatch,
        at: DateTime<Utc>,
    ) -> Result<Vec<Certificate>, BackendError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let mut updated = Vec::new();
        for cert in doc.certificates.iter_mut().filter(|c| filter.matches(c)) {
            cert.apply(patch, at);
            updated.push(cert.clone());
        }
        if !updated.is_empty() {
            self.save(&doc).await?;
        }
        Ok(updated)
    }

    async fn delete_where(&self, filter: &Filter) -> Result<u64, BackendError> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let before = doc.certificates.len();
        doc.certificates.retain(|c| !filter.matches(c));
        let removed = before - doc.certificates.len();
        if removed > 0 {
            self.save(&doc).await?;
        }
        Ok(removed as u64)
    }
}
