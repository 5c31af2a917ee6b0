// dbbackup/src/backup/db_dump.rs
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use which::which;

use super::{ArtifactProducer, DatabaseKind};
use crate::errors::{BackupError, Result};

#[derive(Clone)]
pub struct PgConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

impl fmt::Debug for PgConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .finish()
    }
}

/// Dumps a PostgreSQL database to a plain SQL file with `pg_dump`.
#[derive(Debug)]
pub struct PgDumpProducer {
    program: PathBuf,
    connection: PgConnectionParams,
}

impl PgDumpProducer {
    /// Uses the `pg_dump` found in PATH.
    pub fn locate(connection: PgConnectionParams) -> Result<Self> {
        let program = which("pg_dump")?;
        debug!(program = %program.display(), "Found pg_dump executable");
        Ok(Self::with_program(program, connection))
    }

    pub fn with_program(program: impl Into<PathBuf>, connection: PgConnectionParams) -> Self {
        Self {
            program: program.into(),
            connection,
        }
    }

    fn args(&self, destination: &Path) -> Vec<OsString> {
        let c = &self.connection;
        vec![
            "-h".into(),
            c.host.clone().into(),
            "-p".into(),
            c.port.to_string().into(),
            "-U".into(),
            c.user.clone().into(),
            "-d".into(),
            c.database.clone().into(),
            "-f".into(),
            destination.as_os_str().to_owned(),
        ]
    }
}

#[async_trait]
impl ArtifactProducer for PgDumpProducer {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Postgres
    }

    async fn produce(&self, destination: &Path) -> Result<()> {
        debug!(
            host = %self.connection.host,
            port = self.connection.port,
            database = %self.connection.database,
            "Running pg_dump"
        );

        let mut command = Command::new(&self.program);
        command.args(self.args(destination));
        if let Some(password) = &self.connection.password {
            command.env("PGPASSWORD", password);
        }

        let output = command
            .output()
            .await
            .map_err(|e| BackupError::io("Failed to execute", &self.program, e))?;

        if !output.status.success() {
            return Err(BackupError::DumpFailed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection() -> PgConnectionParams {
        PgConnectionParams {
            host: "db.internal".into(),
            port: 6543,
            user: "backup".into(),
            password: Some("hunter2".into()),
            database: "app".into(),
        }
    }

    #[test]
    fn test_pg_dump_arguments() {
        let producer = PgDumpProducer::with_program("pg_dump", connection());
        let args = producer.args(Path::new("/work/backup-x.sql"));
        let expected: Vec<OsString> = [
            "-h", "db.internal", "-p", "6543", "-U", "backup", "-d", "app", "-f",
            "/work/backup-x.sql",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn test_password_is_not_debug_printed() {
        let producer = PgDumpProducer::with_program("pg_dump", connection());
        assert!(!format!("{:?}", producer).contains("hunter2"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_dump_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let producer = PgDumpProducer::with_program("false", connection());

        let err = producer
            .produce(&tmp.path().join("backup.sql"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::DumpFailed { status, .. } if !status.success()));
    }

    #[tokio::test]
    async fn test_missing_program_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let producer =
            PgDumpProducer::with_program(tmp.path().join("no-such-pg_dump"), connection());

        let err = producer
            .produce(&tmp.path().join("backup.sql"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::Io { .. }));
    }
}
