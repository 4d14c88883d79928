//! Database bootstrap command: `coursehub init-db`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use coursehub::catalog::db::CatalogDb;
use coursehub::config::CoursehubToml;

pub fn cmd_init_db(config_path: &Path, db_path: Option<PathBuf>) -> Result<()> {
    let db_path = match db_path {
        Some(path) => path,
        None => {
            let mut toml = CoursehubToml::load_or_default(config_path)?;
            toml.apply_env()?;
            toml.storage.path
        }
    };

    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }
    CatalogDb::new(&db_path)?;
    println!("Catalog database initialized at {}", db_path.display());
    Ok(())
}
