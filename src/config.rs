//! Configuration for the coursehub server, read from `coursehub.toml`.
//!
//! Settings are layered file → environment → CLI. Every field has a default,
//! so an absent or partial file is valid.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! cors_permissive = false
//!
//! [storage]
//! backend = "sqlite"      # or "memory"
//! path = ".coursehub/coursehub.db"
//!
//! [limits]
//! title_max = 200
//! text_max = 10000
//!
//! [logging]
//! filter = "info"
//! format = "pretty"       # or "json"
//! ```
//!
//! Environment overrides: `COURSEHUB_PORT`, `COURSEHUB_STORAGE`,
//! `COURSEHUB_DB_PATH`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "coursehub.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local maps; everything is lost on restart.
    Memory,
    #[default]
    Sqlite,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "sqlite" => Ok(StorageBackend::Sqlite),
            _ => anyhow::bail!("Invalid storage backend '{}'. Valid values: memory, sqlite", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allow any origin. Meant for local UI development only.
    #[serde(default)]
    pub cors_permissive: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_permissive: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
    /// SQLite database file; ignored by the memory backend.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".coursehub/coursehub.db")
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_db_path(),
        }
    }
}

/// Field length bounds enforced on incoming proposal and course content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default = "default_title_max")]
    pub title_max: usize,
    /// Bound for every free-text field other than the title.
    #[serde(default = "default_text_max")]
    pub text_max: usize,
}

fn default_title_max() -> usize {
    200
}

fn default_text_max() -> usize {
    10_000
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            title_max: default_title_max(),
            text_max: default_text_max(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            format: LogFormat::default(),
        }
    }
}

/// Root of `coursehub.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoursehubToml {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub limits: Limits,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl CoursehubToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse coursehub.toml")
    }

    /// Returns the default configuration if `path` doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize coursehub.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Apply `COURSEHUB_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup; unset keys leave the file
    /// value in place.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(port) = lookup("COURSEHUB_PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid COURSEHUB_PORT '{}'", port))?;
        }
        if let Some(backend) = lookup("COURSEHUB_STORAGE") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(path) = lookup("COURSEHUB_DB_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        Ok(())
    }

    /// Validate the configuration and return any problems.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.server.host.trim().is_empty() {
            problems.push("server.host must not be empty".to_string());
        }
        if self.limits.title_max == 0 {
            problems.push("limits.title_max must be greater than 0".to_string());
        }
        if self.limits.text_max == 0 {
            problems.push("limits.text_max must be greater than 0".to_string());
        }
        if self.storage.backend == StorageBackend::Sqlite
            && self.storage.path.as_os_str().is_empty()
        {
            problems.push("storage.path is required for the sqlite backend".to_string());
        }
        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.logging.filter) {
            problems.push(format!(
                "Invalid logging.filter '{}': {}",
                self.logging.filter, e
            ));
        }

        problems
    }
}
