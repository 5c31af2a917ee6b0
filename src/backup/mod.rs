mod logic;
pub(crate) mod db_dump;
pub(crate) mod file_copy;
pub(crate) mod s3_upload;

use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;

use crate::config::{BackupConfig, DEFAULT_PG_PORT, DatabaseSettings};
use crate::errors::{BackupError, Result};

pub use logic::{UploadedBackup, execute_backup};
pub use s3_upload::{ObjectStore, S3ObjectStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    Postgres,
    Sqlite,
}

impl DatabaseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DatabaseKind::Postgres => "postgres",
            DatabaseKind::Sqlite => "sqlite",
        }
    }

    /// File extension of the artifact this kind produces.
    pub fn extension(self) -> &'static str {
        match self {
            DatabaseKind::Postgres => "sql",
            DatabaseKind::Sqlite => "sqlite",
        }
    }
}

impl FromStr for DatabaseKind {
    type Err = BackupError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(DatabaseKind::Postgres),
            "sqlite" => Ok(DatabaseKind::Sqlite),
            other => Err(BackupError::UnsupportedDatabaseType(other.to_string())),
        }
    }
}

/// Writes one backup artifact for a database to a local file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactProducer: Send + Sync {
    fn kind(&self) -> DatabaseKind;

    /// Create the artifact at `destination`. The parent directory already exists.
    async fn produce(&self, destination: &Path) -> Result<()>;
}

/// Validates the database settings and picks the matching producer.
/// Touches neither the filesystem nor the network.
pub fn producer_for(settings: &DatabaseSettings) -> Result<Box<dyn ArtifactProducer>> {
    match settings.kind.parse::<DatabaseKind>()? {
        DatabaseKind::Postgres => {
            let required = |value: &Option<String>, key: &'static str| {
                value
                    .clone()
                    .ok_or(BackupError::MissingSetting(key, "PostgreSQL"))
            };
            let port = match &settings.port {
                Some(raw) => raw.parse::<u16>().map_err(|e| {
                    BackupError::Config(format!("DB_PORT must be a valid port number, got {:?}: {}", raw, e))
                })?,
                None => DEFAULT_PG_PORT,
            };
            let connection = db_dump::PgConnectionParams {
                host: required(&settings.host, "DB_HOST")?,
                port,
                user: required(&settings.user, "DB_USER")?,
                password: settings.password.clone(),
                database: required(&settings.name, "DB_NAME")?,
            };
            Ok(Box::new(db_dump::PgDumpProducer::locate(connection)?))
        }
        DatabaseKind::Sqlite => {
            let source = settings
                .path
                .clone()
                .ok_or(BackupError::MissingSetting("DB_PATH", "SQLite"))?;
            Ok(Box::new(file_copy::SqliteCopyProducer::new(source)))
        }
    }
}

/// Public entry point for the backup process.
pub async fn run_backup_flow(config: &BackupConfig, store: &dyn ObjectStore) -> Result<UploadedBackup> {
    let producer = producer_for(&config.database)?;
    execute_backup(producer.as_ref(), store, &config.work_dir, chrono::Utc::now()).await
}
