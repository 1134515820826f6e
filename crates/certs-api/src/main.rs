//! # certs-api: Binary Entry Point
//!
//! Opens the configured certificate backend and starts the Axum HTTP
//! server. Binds to configurable port (default 8080).

use certs_api::state::{AppConfig, AppState};
use certs_core::{open_backend, CertificateStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {e}");
        e
    })?;
    tracing::info!(?config, "configuration loaded");

    let backend = open_backend(&config.backend).await.map_err(|e| {
        tracing::error!("Failed to open certificate backend: {e}");
        e
    })?;
    let store = CertificateStore::new(backend);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = certs_api::app(AppState::new(store.clone(), config));

    tracing::info!("Certificates API listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await?;
    tracing::info!("Certificate store closed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    tracing::info!("Shutdown signal received");
}
