use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use coursehub::config::CONFIG_FILE;

mod cmd;

#[derive(Parser)]
#[command(name = "coursehub")]
#[command(version, about = "Course proposal review and publishing backend")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to serve on (overrides config and COURSEHUB_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Storage backend: memory or sqlite
        #[arg(long)]
        storage: Option<String>,

        /// SQLite database path
        #[arg(long)]
        db_path: Option<PathBuf>,

        /// Enable dev mode (CORS permissive for a local UI dev server)
        #[arg(long)]
        dev: bool,
    },
    /// Create the SQLite schema and exit
    InitDb {
        /// Database path (defaults to storage.path from the config)
        #[arg(long)]
        db_path: Option<PathBuf>,
    },
    /// Validate the configuration and report any problems
    CheckConfig,
    /// Write a default configuration file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve {
            port,
            storage,
            db_path,
            dev,
        } => {
            cmd::cmd_serve(
                &cli.config,
                cmd::ServeOverrides {
                    port: *port,
                    storage: storage.clone(),
                    db_path: db_path.clone(),
                    dev: *dev,
                },
            )
            .await?;
        }
        Commands::InitDb { db_path } => cmd::cmd_init_db(&cli.config, db_path.clone())?,
        Commands::CheckConfig => cmd::cmd_check_config(&cli.config)?,
        Commands::InitConfig => cmd::cmd_init_config(&cli.config)?,
    }

    Ok(())
}
