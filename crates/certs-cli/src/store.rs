//! # Store Selection & Output
//!
//! Global flags choosing the certificate backend, plus the JSON output
//! helpers shared by every subcommand.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use certs_core::{open_backend, BackendConfig, Certificate, CertificateStore};

/// Backend selection flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// JSON file holding the certificate collection.
    #[arg(
        long,
        global = true,
        env = "CERTS_DATA_FILE",
        default_value = "certificates.json"
    )]
    pub data_file: PathBuf,

    /// PostgreSQL connection string. Takes precedence over --data-file.
    #[arg(long, global = true, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Public origin used to build verification URLs.
    #[arg(
        long,
        global = true,
        env = "CERTS_PUBLIC_BASE_URL",
        default_value = "http://localhost:8080"
    )]
    pub base_url: String,
}

impl StoreArgs {
    /// Backend configuration implied by the flags.
    pub fn backend_config(&self) -> BackendConfig {
        match &self.database_url {
            Some(url) if !url.trim().is_empty() => BackendConfig::Postgres {
                url: url.clone(),
                max_connections: 2,
            },
            _ => BackendConfig::File {
                path: self.data_file.clone(),
            },
        }
    }

    /// Open the selected backend.
    pub async fn open(&self) -> Result<CertificateStore> {
        let config = self.backend_config();
        let backend = open_backend(&config)
            .await
            .with_context(|| format!("failed to open {} certificate backend", config.kind()))?;
        Ok(CertificateStore::new(backend))
    }
}

/// Write `value` as pretty JSON followed by a newline.
pub fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value).context("failed to encode output")?;
    writeln!(out)?;
    Ok(())
}

/// A certificate together with its derived presentation data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateView<'a> {
    pub certificate: &'a Certificate,
    pub verification_url: String,
    pub export_file_stem: String,
}

impl<'a> CertificateView<'a> {
    pub fn new(certificate: &'a Certificate, base_url: &str) -> Self {
        Self {
            certificate,
            verification_url: certs_core::verification_url(base_url, &certificate.id),
            export_file_stem: certificate.export_file_stem(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(database_url: Option<&str>) -> StoreArgs {
        StoreArgs {
            data_file: PathBuf::from("certs.json"),
            database_url: database_url.map(str::to_string),
            base_url: "http://localhost:8080".into(),
        }
    }

    #[test]
    fn file_backend_by_default() {
        assert_eq!(
            args(None).backend_config(),
            BackendConfig::File {
                path: PathBuf::from("certs.json")
            }
        );
        assert_eq!(args(Some("  ")).backend_config().kind(), "file");
    }

    #[test]
    fn database_url_selects_postgres() {
        assert_eq!(
            args(Some("postgres://db/certs")).backend_config().kind(),
            "postgres"
        );
    }

    #[test]
    fn print_json_is_pretty_with_trailing_newline() {
        let mut out = Vec::new();
        print_json(&mut out, &serde_json::json!({"a": 1})).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "{\n  \"a\": 1\n}\n");
    }
}
