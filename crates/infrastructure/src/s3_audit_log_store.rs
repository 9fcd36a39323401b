use std::io::Read;

use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use flate2::read::GzDecoder;
use tracing::debug;
use tripwire_application::AuditLogStore;
use tripwire_core::{AppError, AppResult};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Audit log batches stored as S3 objects.
pub struct S3AuditLogStore {
    client: S3Client,
}

impl S3AuditLogStore {
    /// Creates a store reading through the given client.
    #[must_use]
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuditLogStore for S3AuditLogStore {
    async fn fetch_audit_log(&self, bucket: &str, key: &str) -> AppResult<Vec<u8>> {
        let object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to download s3://{bucket}/{key}: {error}"))
            })?;

        let body = object.body.collect().await.map_err(|error| {
            AppError::Unavailable(format!("failed to read s3://{bucket}/{key}: {error}"))
        })?;
        let bytes = body.into_bytes();
        debug!(bucket, key, bytes = bytes.len(), "downloaded audit log object");

        decompress(bytes.as_ref()).map_err(|error| {
            AppError::Unavailable(format!("failed to decompress s3://{bucket}/{key}: {error}"))
        })
    }
}

/// Inflates gzip content, passing anything else through unchanged.
fn decompress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes.to_vec());
    }

    let mut decoded = Vec::with_capacity(bytes.len().saturating_mul(4));
    GzDecoder::new(bytes).read_to_end(&mut decoded)?;
    Ok(decoded)
}
