use async_trait::async_trait;
use tripwire_core::AppResult;
use tripwire_domain::ScanRequest;

/// One scan request message and the delay to deliver it with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledScanRequest {
    /// Seconds the queue should hold the message before delivery.
    pub delay_seconds: u32,
    /// Message body.
    pub request: ScanRequest,
}

/// Work queue consumed by the resource scanner.
#[async_trait]
pub trait ScanQueue: Send + Sync {
    /// Sends all requests, retrying transient failures internally.
    ///
    /// Returns an error only once retries are exhausted or a request is
    /// rejected permanently.
    async fn send_scan_requests(&self, requests: Vec<ScheduledScanRequest>) -> AppResult<()>;
}
