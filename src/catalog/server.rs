use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::api::{self, AppState};
use super::db::SqliteStore;
use super::memory::MemoryStore;
use super::repository::Repositories;
use crate::config::{CoursehubToml, Limits, StorageBackend};

/// Configuration for the catalog server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backend: StorageBackend,
    pub db_path: PathBuf,
    pub limits: Limits,
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_toml(&CoursehubToml::default())
    }
}

impl ServerConfig {
    pub fn from_toml(toml: &CoursehubToml) -> Self {
        Self {
            host: toml.server.host.clone(),
            port: toml.server.port,
            backend: toml.storage.backend,
            db_path: toml.storage.path.clone(),
            limits: toml.limits,
            cors_permissive: toml.server.cors_permissive,
        }
    }
}

/// Open the configured store. The SQLite backend creates the parent
/// directory and runs migrations.
pub fn open_repositories(backend: StorageBackend, db_path: &std::path::Path) -> Result<Repositories> {
    match backend {
        StorageBackend::Memory => Ok(Repositories::from_store(Arc::new(MemoryStore::new()))),
        StorageBackend::Sqlite => {
            if let Some(parent) = db_path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
            let store = SqliteStore::open(db_path).context("Failed to initialize catalog database")?;
            Ok(Repositories::from_store(Arc::new(store)))
        }
    }
}

/// Build the full application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the catalog server.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let repos = open_repositories(config.backend, &config.db_path)?;
    let state = Arc::new(AppState::new(&repos, config.limits));

    let mut app = build_router(state);
    if config.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!(%local_addr, backend = %config.backend, "Coursehub listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}
