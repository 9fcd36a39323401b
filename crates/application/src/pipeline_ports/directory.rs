use async_trait::async_trait;
use tripwire_core::AppResult;
use tripwire_domain::MonitoredAccount;

/// Directory service listing accounts registered for scanning.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Returns every monitored account of the configured integration type.
    async fn list_monitored_accounts(&self) -> AppResult<Vec<MonitoredAccount>>;
}
