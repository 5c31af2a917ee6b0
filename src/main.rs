//! Database Backup Tool
//!
//! Dumps a PostgreSQL or SQLite database and uploads the artifact to S3-compatible storage.

// dbbackup/src/main.rs
mod backup;
mod config;
mod errors;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use backup::S3ObjectStore;
use config::BackupConfig;

#[derive(Debug, Parser)]
#[command(name = "dbbackup", version, about = "Back up a database to S3-compatible storage")]
struct Cli {
    /// Dotenv file to load settings from before reading the environment
    #[arg(long, value_name = "PATH", default_value = ".env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let env_loaded = dotenv::from_path(&cli.env_file);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_level(true).with_target(false))
        .init();

    if let Err(e) = env_loaded {
        debug!(env_file = %cli.env_file.display(), error = %e, "Env file not loaded, using process environment");
    }

    match run_app().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let config = BackupConfig::from_env().context("Failed to load backup configuration")?;
    debug!(?config, "Loaded configuration");

    let store = S3ObjectStore::new(&config.storage).await;
    let uploaded = backup::run_backup_flow(&config, &store)
        .await
        .context("Backup process failed")?;

    info!(key = %uploaded.key, bytes = uploaded.bytes, e_tag = ?uploaded.e_tag, "Backup stored");
    Ok(())
}
