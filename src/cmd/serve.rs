//! API server command: `coursehub serve`.

use std::path::{Path, PathBuf};

use anyhow::Result;

use coursehub::catalog::server::{ServerConfig, start_server};
use coursehub::config::CoursehubToml;

/// CLI flags that take precedence over the file and environment.
pub struct ServeOverrides {
    pub port: Option<u16>,
    pub storage: Option<String>,
    pub db_path: Option<PathBuf>,
    pub dev: bool,
}

pub async fn cmd_serve(config_path: &Path, overrides: ServeOverrides) -> Result<()> {
    let mut toml = CoursehubToml::load_or_default(config_path)?;
    toml.apply_env()?;

    if let Some(port) = overrides.port {
        toml.server.port = port;
    }
    if let Some(storage) = &overrides.storage {
        toml.storage.backend = storage.parse()?;
    }
    if let Some(db_path) = overrides.db_path {
        toml.storage.path = db_path;
    }
    if overrides.dev {
        toml.server.cors_permissive = true;
    }

    let problems = toml.validate();
    if !problems.is_empty() {
        anyhow::bail!("Invalid configuration:\n  {}", problems.join("\n  "));
    }

    coursehub::logging::init(&toml.logging)?;
    start_server(ServerConfig::from_toml(&toml)).await
}
