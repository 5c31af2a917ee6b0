use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{ArtifactProducer, DatabaseKind};
use crate::errors::{BackupError, Result};

/// Backs up a SQLite database by copying its file verbatim.
#[derive(Debug)]
pub struct SqliteCopyProducer {
    source: PathBuf,
}

impl SqliteCopyProducer {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[async_trait]
impl ArtifactProducer for SqliteCopyProducer {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sqlite
    }

    async fn produce(&self, destination: &Path) -> Result<()> {
        tokio::fs::copy(&self.source, destination)
            .await
            .map_err(|e| BackupError::io("Failed to copy SQLite database", &self.source, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_copy_preserves_bytes() -> anyhow::Result<()> {
        let tmp = tempfile::tempdir()?;
        let source = tmp.path().join("app.db");
        std::fs::write(&source, b"SQLite format 3\0rest")?;
        let dest = tmp.path().join("backup.sqlite");

        SqliteCopyProducer::new(&source).produce(&dest).await?;

        assert_eq!(std::fs::read(&dest)?, std::fs::read(&source)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_source_file() {
        let tmp = tempfile::tempdir().unwrap();
        let producer = SqliteCopyProducer::new(tmp.path().join("missing.db"));

        let err = producer
            .produce(&tmp.path().join("backup.sqlite"))
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::Io { ref path, .. } if path.ends_with("missing.db")));
        assert!(!tmp.path().join("backup.sqlite").exists());
    }
}
