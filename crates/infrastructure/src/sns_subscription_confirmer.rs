use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::config::Region;
use aws_sdk_sns::Client as SnsClient;
use tripwire_application::SubscriptionConfirmer;
use tripwire_core::{AppError, AppResult};

/// Confirms SNS topic subscriptions in the topic's own region.
pub struct SnsSubscriptionConfirmer {
    sdk_config: SdkConfig,
}

impl SnsSubscriptionConfirmer {
    /// Creates a confirmer that derives per-region clients from shared settings.
    #[must_use]
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn client_for(&self, topic_arn: &str) -> SnsClient {
        let mut builder = aws_sdk_sns::config::Builder::from(&self.sdk_config);
        if let Some(region) = topic_region(topic_arn) {
            builder = builder.region(Region::new(region.to_owned()));
        }
        SnsClient::from_conf(builder.build())
    }
}

#[async_trait]
impl SubscriptionConfirmer for SnsSubscriptionConfirmer {
    async fn confirm_subscription(&self, topic_arn: &str, token: &str) -> AppResult<()> {
        self.client_for(topic_arn)
            .confirm_subscription()
            .topic_arn(topic_arn)
            .token(token)
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!(
                    "failed to confirm subscription to '{topic_arn}': {error}"
                ))
            })?;

        Ok(())
    }
}

/// Region segment of a topic ARN (`arn:partition:sns:region:account:name`).
fn topic_region(topic_arn: &str) -> Option<&str> {
    topic_arn
        .split(':')
        .nth(3)
        .filter(|region| !region.is_empty())
}

#[cfg(test)]
mod tests {
    use super::topic_region;

    #[test]
    fn region_comes_from_the_topic_arn() {
        assert_eq!(
            topic_region("arn:aws:sns:eu-west-1:111111111111:audit-events"),
            Some("eu-west-1")
        );
        assert_eq!(topic_region("audit-events"), None);
    }
}
