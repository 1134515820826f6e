//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. The certificate store is constructed once at
//! startup and injected here; handlers never open backends themselves.

use std::path::PathBuf;
use std::sync::Arc;

use certs_core::{BackendConfig, CertificateId, CertificateStore};

use crate::middleware::metrics::ApiMetrics;

/// Default connection pool size for the PostgreSQL backend.
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Which persistence backend to open.
    pub backend: BackendConfig,
    /// Public origin used to build verification URLs.
    pub public_base_url: String,
    /// Whether `DELETE /v1/certificates` is enabled at all.
    pub allow_clear: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // BackendConfig's Debug redacts database credentials.
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("backend", &self.backend)
            .field("public_base_url", &self.public_base_url)
            .field("allow_clear", &self.allow_clear)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            backend: BackendConfig::Memory,
            public_base_url: "http://localhost:8080".to_string(),
            allow_clear: false,
        }
    }
}

impl AppConfig {
    /// Build configuration from environment variables.
    ///
    /// - `PORT` (default: 8080)
    /// - `CERTS_BACKEND`: `memory`, `file`, or `postgres` (default: `postgres`
    ///   when `DATABASE_URL` is set, otherwise `file`)
    /// - `CERTS_DATA_FILE` (default: `certificates.json`)
    /// - `DATABASE_URL` (required for `postgres`)
    /// - `CERTS_DB_MAX_CONNECTIONS` (default: 10)
    /// - `CERTS_PUBLIC_BASE_URL` (default: `http://localhost:8080`)
    /// - `CERTS_ALLOW_CLEAR` (default: false)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            None => 8080,
        };

        let database_url = var("DATABASE_URL");
        let kind = var("CERTS_BACKEND").map(|k| k.trim().to_ascii_lowercase());
        let backend = match (kind.as_deref(), database_url) {
            (Some("memory"), _) => BackendConfig::Memory,
            (Some("file"), _) | (None, None) => BackendConfig::File {
                path: var("CERTS_DATA_FILE")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("certificates.json")),
            },
            (Some("postgres"), None) => return Err(ConfigError::Missing("DATABASE_URL")),
            (Some("postgres") | None, Some(url)) => BackendConfig::Postgres {
                url,
                max_connections: match var("CERTS_DB_MAX_CONNECTIONS") {
                    Some(raw) => raw
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::Invalid("CERTS_DB_MAX_CONNECTIONS", raw))?,
                    None => DEFAULT_DB_MAX_CONNECTIONS,
                },
            },
            (Some(other), _) => {
                return Err(ConfigError::Invalid("CERTS_BACKEND", other.to_string()))
            }
        };

        let allow_clear = match var("CERTS_ALLOW_CLEAR") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid("CERTS_ALLOW_CLEAR", raw))?,
            None => false,
        };

        Ok(Self {
            port,
            backend,
            public_base_url: var("CERTS_PUBLIC_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string()),
            allow_clear,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: CertificateStore,
    pub config: Arc<AppConfig>,
    pub metrics: ApiMetrics,
}

impl AppState {
    /// State over an opened store.
    pub fn new(store: CertificateStore, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
            metrics: ApiMetrics::new(),
        }
    }

    /// State over a fresh in-memory store with default configuration.
    pub fn in_memory() -> Self {
        Self::new(CertificateStore::in_memory(), AppConfig::default())
    }

    /// Public verification URL for a certificate.
    pub fn verification_url(&self, id: &CertificateId) -> String {
        certs_core::verification_url(&self.config.public_base_url, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_file_backend() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.backend,
            BackendConfig::File {
                path: PathBuf::from("certificates.json")
            }
        );
        assert_eq!(config.public_base_url, "http://localhost:8080");
        assert!(!config.allow_clear);
    }

    #[test]
    fn database_url_selects_postgres() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://u:p@db/certs"),
            ("CERTS_DB_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Postgres {
                url: "postgres://u:p@db/certs".into(),
                max_connections: 4
            }
        );
    }

    #[test]
    fn explicit_backend_overrides_database_url() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://u:p@db/certs"),
            ("CERTS_BACKEND", "memory"),
        ])
        .unwrap();
        assert_eq!(config.backend, BackendConfig::Memory);
    }

    #[test]
    fn postgres_without_url_is_error() {
        let err = config_from(&[("CERTS_BACKEND", "postgres")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid("PORT", _))
        ));
        assert!(matches!(
            config_from(&[("CERTS_BACKEND", "redis")]),
            Err(ConfigError::Invalid("CERTS_BACKEND", _))
        ));
        assert!(matches!(
            config_from(&[("CERTS_ALLOW_CLEAR", "maybe")]),
            Err(ConfigError::Invalid("CERTS_ALLOW_CLEAR", _))
        ));
    }

    #[test]
    fn allow_clear_parses_booleans() {
        assert!(config_from(&[("CERTS_ALLOW_CLEAR", "true")]).unwrap().allow_clear);
        assert!(config_from(&[("CERTS_ALLOW_CLEAR", "1")]).unwrap().allow_clear);
        assert!(!config_from(&[("CERTS_ALLOW_CLEAR", "off")]).unwrap().allow_clear);
    }

    #[test]
    fn debug_redacts_database_url() {
        let config = config_from(&[("DATABASE_URL", "postgres://admin:hunter2@db/certs")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"), "{debug}");
    }

    #[test]
    fn verification_url_uses_public_base() {
        let config = AppConfig {
            public_base_url: "https://certs.example.org/".into(),
            ..AppConfig::default()
        };
        let state = AppState::new(CertificateStore::in_memory(), config);
        assert_eq!(
            state.verification_url(&CertificateId::new("abc")),
            "https://certs.example.org/verify/abc"
        );
    }
}
