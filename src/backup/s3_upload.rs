// dbbackup/src/backup/s3_upload.rs
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::config::Region;
use s3::error::DisplayErrorContext;
use s3::primitives::ByteStream;
use s3::types::ObjectCannedAcl;
use tracing::debug;

use crate::config::StorageConfig;
use crate::errors::{BackupError, Result};

/// What the store reported back for a stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutReceipt {
    pub e_tag: Option<String>,
}

/// Destination for finished backup artifacts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `body` as a single object under `key`.
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<PutReceipt>;
}

/// S3-compatible object storage (Contabo, DigitalOcean Spaces, MinIO, ...).
pub struct S3ObjectStore {
    client: s3::Client,
    bucket: String,
    acl: Option<ObjectCannedAcl>,
}

impl S3ObjectStore {
    pub async fn new(storage: &StorageConfig) -> Self {
        let sdk_config = aws_config::defaults(s3::config::BehaviorVersion::latest())
            .endpoint_url(&storage.endpoint_url)
            .region(Region::new(storage.region.clone()))
            .credentials_provider(s3::config::Credentials::new(
                &storage.access_key_id,
                &storage.secret_access_key,
                None, // session_token
                None, // expiry
                "Static", // provider_name
            ))
            .load()
            .await;

        // Most S3-compatible providers only serve path-style URLs.
        let s3_config = s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(s3_config),
            bucket: storage.bucket_name.clone(),
            acl: storage.acl.as_deref().map(ObjectCannedAcl::from),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<PutReceipt> {
        debug!(bucket = %self.bucket, key, "Sending PutObject");

        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_acl(self.acl.clone())
            .send()
            .await
            .map_err(|e| BackupError::Upload {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(PutReceipt {
            e_tag: output.e_tag().map(str::to_string),
        })
    }
}
