use async_trait::async_trait;
use tripwire_core::AppResult;

/// Object store holding compressed batches of audit events.
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    /// Returns the decompressed, newline-delimited contents of one object.
    async fn fetch_audit_log(&self, bucket: &str, key: &str) -> AppResult<Vec<u8>>;
}
