use async_trait::async_trait;
use tripwire_core::AppResult;

/// Notification topic handshake.
#[async_trait]
pub trait SubscriptionConfirmer: Send + Sync {
    /// Confirms a pending subscription with the token the topic sent.
    async fn confirm_subscription(&self, topic_arn: &str, token: &str) -> AppResult<()>;
}
