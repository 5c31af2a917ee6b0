use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, error, info, warn};

use super::{ArtifactProducer, DatabaseKind, ObjectStore};
use crate::errors::{BackupError, Result};

/// Outcome of a completed backup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedBackup {
    pub key: String,
    pub bytes: usize,
    pub e_tag: Option<String>,
}

/// ISO-8601 UTC with millisecond precision, with `:` and `.` swapped for `-`
/// so the result is safe in a file name.
pub fn filesystem_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

pub fn artifact_file_name(kind: DatabaseKind, timestamp: &str) -> String {
    format!("backup-{}.{}", timestamp, kind.extension())
}

pub fn object_key(kind: DatabaseKind, file_name: &str) -> String {
    format!("backups/{}/{}", kind.as_str(), file_name)
}

/// Creates the working directory if it is absent.
async fn prepare_work_dir(work_dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|e| BackupError::io("Failed to create working directory", work_dir, e))
}

/// Runs one backup: produce the artifact, upload it, delete the local copy.
///
/// The artifact is only removed after a successful upload; on any earlier
/// failure it stays in `work_dir` for manual recovery.
pub async fn execute_backup(
    producer: &dyn ArtifactProducer,
    store: &dyn ObjectStore,
    work_dir: &Path,
    now: DateTime<Utc>,
) -> Result<UploadedBackup> {
    let kind = producer.kind();
    prepare_work_dir(work_dir).await?;

    let file_name = artifact_file_name(kind, &filesystem_timestamp(now));
    let artifact_path = work_dir.join(&file_name);
    info!(path = %artifact_path.display(), "Creating backup file");

    match upload_artifact(producer, store, &artifact_path, &file_name).await {
        Ok(uploaded) => {
            tokio::fs::remove_file(&artifact_path)
                .await
                .map_err(|e| BackupError::io("Failed to remove local artifact", &artifact_path, e))?;
            match kind {
                DatabaseKind::Postgres => info!("PostgreSQL backup completed successfully!"),
                DatabaseKind::Sqlite => info!("SQLite backup completed successfully!"),
            }
            Ok(uploaded)
        }
        Err(e) => {
            match kind {
                DatabaseKind::Postgres => error!(error = %e, "Error during PostgreSQL backup"),
                DatabaseKind::Sqlite => error!(error = %e, "Error during SQLite backup"),
            }
            if artifact_path.exists() {
                warn!(path = %artifact_path.display(), "Local artifact left in place");
            }
            Err(e)
        }
    }
}

async fn upload_artifact(
    producer: &dyn ArtifactProducer,
    store: &dyn ObjectStore,
    artifact_path: &Path,
    file_name: &str,
) -> Result<UploadedBackup> {
    producer.produce(artifact_path).await?;

    let body = tokio::fs::read(artifact_path)
        .await
        .map_err(|e| BackupError::io("Failed to read artifact", artifact_path, e))?;
    let bytes = body.len();
    let key = object_key(producer.kind(), file_name);
    info!(key = %key, bytes, "Uploading to S3");

    let receipt = store.put_object(&key, body).await?;
    debug!(key = %key, e_tag = ?receipt.e_tag, "Upload acknowledged");

    Ok(UploadedBackup {
        key,
        bytes,
        e_tag: receipt.e_tag,
    })
}
