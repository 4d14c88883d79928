//! Configuration commands: `coursehub check-config` and `coursehub init-config`.

use std::path::Path;

use anyhow::Result;

use coursehub::config::CoursehubToml;

pub fn cmd_check_config(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("Config file: {}", config_path.display());
    } else {
        println!(
            "No config file found at {}, using defaults",
            config_path.display()
        );
    }

    let mut toml = CoursehubToml::load_or_default(config_path)?;
    toml.apply_env()?;

    println!();
    println!("[server]");
    println!("  host = \"{}\"", toml.server.host);
    println!("  port = {}", toml.server.port);
    println!("  cors_permissive = {}", toml.server.cors_permissive);
    println!("[storage]");
    println!("  backend = \"{}\"", toml.storage.backend);
    println!("  path = \"{}\"", toml.storage.path.display());
    println!("[limits]");
    println!("  title_max = {}", toml.limits.title_max);
    println!("  text_max = {}", toml.limits.text_max);
    println!("[logging]");
    println!("  filter = \"{}\"", toml.logging.filter);
    println!("  format = \"{}\"", toml.logging.format);
    println!();

    let problems = toml.validate();
    if problems.is_empty() {
        println!("Configuration OK");
        return Ok(());
    }

    println!("Problems:");
    for problem in &problems {
        println!("  - {}", problem);
    }
    anyhow::bail!("{} configuration problem(s) found", problems.len())
}

/// Write a default config file, leaving an existing one alone.
pub fn cmd_init_config(config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("{} already exists", config_path.display());
        println!("Delete it first if you want to recreate it.");
        return Ok(());
    }

    if let Some(parent) = config_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    CoursehubToml::default().save(config_path)?;

    println!("Created {}", config_path.display());
    println!();
    println!("You can now customize:");
    println!("  - [server] host, port, cors_permissive");
    println!("  - [storage] backend, path");
    println!("  - [limits] title_max, text_max");
    println!("  - [logging] filter, format");
    Ok(())
}
