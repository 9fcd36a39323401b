use async_trait::async_trait;
use tripwire_core::AppResult;

/// Long-term resource inventory.
#[async_trait]
pub trait ResourceInventory: Send + Sync {
    /// Removes the given resources in one call.
    async fn delete_resources(&self, resource_ids: Vec<String>) -> AppResult<()>;
}
