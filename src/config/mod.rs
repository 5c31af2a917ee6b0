// dbbackup/src/config/mod.rs
use std::env;
use std::fmt;
use std::path::PathBuf;

use url::Url;

use crate::errors::{BackupError, Result};

const DEFAULT_WORK_DIR: &str = ".tmp";
pub const DEFAULT_PG_PORT: u16 = 5432;

/// Raw database settings. Which fields matter depends on `kind`; they are
/// validated when the pipeline picks an artifact producer.
#[derive(Clone, Default)]
pub struct DatabaseSettings {
    pub kind: String,
    pub host: Option<String>,
    pub port: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub path: Option<PathBuf>,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

/// Connection to an S3-compatible store.
#[derive(Clone)]
pub struct StorageConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub endpoint_url: String,
    pub bucket_name: String,
    pub acl: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("bucket_name", &self.bucket_name)
            .field("acl", &self.acl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub database: DatabaseSettings,
    pub storage: StorageConfig,
    /// Holds artifacts between creation and upload.
    pub work_dir: PathBuf,
}

impl BackupConfig {
    /// Builds the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let cwd = env::current_dir()
            .map_err(|e| BackupError::io("Failed to resolve current directory", ".", e))?;
        Self::from_lookup(|key| env::var(key).ok(), cwd)
    }

    /// Builds the configuration from an arbitrary variable lookup. Empty values
    /// count as unset. Relative work directories resolve against `base_dir`.
    pub fn from_lookup<F>(lookup: F, base_dir: PathBuf) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| {
            get(key).ok_or(BackupError::MissingSetting(key, "object storage"))
        };

        let database = DatabaseSettings {
            kind: get("DB_TYPE").unwrap_or_default(),
            host: get("DB_HOST"),
            port: get("DB_PORT"),
            user: get("DB_USER"),
            password: get("DB_PASSWORD"),
            name: get("DB_NAME"),
            path: get("DB_PATH").map(PathBuf::from),
        };

        let region = require("CONTABO_BUCKET_REGION")?;
        let endpoint_url = get("S3_ENDPOINT_URL")
            .unwrap_or_else(|| format!("https://{}.contabostorage.com", region));
        Url::parse(&endpoint_url).map_err(|e| {
            BackupError::Config(format!("Invalid object storage endpoint {}: {}", endpoint_url, e))
        })?;

        let storage = StorageConfig {
            access_key_id: require("CONTABO_ACCESS_KEY_ID")?,
            secret_access_key: require("CONTABO_ACCESS_SECRET")?,
            region,
            endpoint_url,
            bucket_name: require("CONTABO_BUCKET_NAME")?,
            acl: get("AWS_ACL"),
        };

        let work_dir = base_dir.join(get("BACKUP_WORK_DIR").unwrap_or_else(|| DEFAULT_WORK_DIR.to_string()));

        Ok(BackupConfig {
            database,
            storage,
            work_dir,
        })
    }
}
