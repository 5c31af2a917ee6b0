use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Unsupported database type: {0}")]
    UnsupportedDatabaseType(String),

    #[error("{0} is required for {1} backup")]
    MissingSetting(&'static str, &'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("pg_dump executable not found in PATH: {0}")]
    DumpToolNotFound(#[from] which::Error),

    #[error("pg_dump failed with status {status}: {stderr}")]
    DumpFailed { status: ExitStatus, stderr: String },

    #[error("{action} {path}: {source}", path = path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },
}

impl BackupError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BackupError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
