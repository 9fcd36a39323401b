use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use aws_sdk_sqs::Client as SqsClient;
use aws_sdk_sqs::types::SendMessageBatchRequestEntry;
use tracing::{debug, warn};
use tripwire_application::{ScanQueue, ScheduledScanRequest};
use tripwire_core::{AppError, AppResult};

use crate::backoff::BackoffPolicy;

/// Largest number of entries one batch send accepts.
const MAX_BATCH_ENTRIES: usize = 10;

/// One message waiting to be accepted by the queue.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingMessage {
    id: String,
    body: String,
    delay_seconds: i32,
}

/// Entry the queue did not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RejectedMessage {
    id: String,
    reason: String,
    sender_fault: bool,
}

#[derive(Debug)]
enum SendError {
    /// The call failed as a whole and may succeed if repeated.
    Transient(String),
    /// The request could not be built.
    Permanent(String),
}

/// Scan work queue backed by SQS batch sends.
pub struct SqsScanQueue {
    client: SqsClient,
    queue_url: String,
    backoff: BackoffPolicy,
}

impl SqsScanQueue {
    /// Creates a queue adapter with the default retry schedule.
    #[must_use]
    pub fn new(client: SqsClient, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            backoff: BackoffPolicy::default(),
        }
    }

    /// Overrides the retry schedule.
    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    async fn send_batch(
        &self,
        batch: Vec<PendingMessage>,
    ) -> Result<Vec<RejectedMessage>, SendError> {
        let entries = batch
            .into_iter()
            .map(|message| {
                SendMessageBatchRequestEntry::builder()
                    .id(message.id)
                    .message_body(message.body)
                    .delay_seconds(message.delay_seconds)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| {
                SendError::Permanent(format!("failed to build scan queue entry: {error}"))
            })?;

        let output = self
            .client
            .send_message_batch()
            .queue_url(self.queue_url.as_str())
            .set_entries(Some(entries))
            .send()
            .await
            .map_err(|error| SendError::Transient(format!("scan queue send failed: {error}")))?;

        Ok(output
            .failed()
            .iter()
            .map(|failure| RejectedMessage {
                id: failure.id().to_owned(),
                reason: format!(
                    "{}: {}",
                    failure.code(),
                    failure.message().unwrap_or("no message")
                ),
                sender_fault: failure.sender_fault(),
            })
            .collect())
    }
}

#[async_trait]
impl ScanQueue for SqsScanQueue {
    async fn send_scan_requests(&self, requests: Vec<ScheduledScanRequest>) -> AppResult<()> {
        let messages = pending_messages(requests)?;
        send_until_accepted(messages, self.backoff, |batch| self.send_batch(batch)).await
    }
}

fn pending_messages(requests: Vec<ScheduledScanRequest>) -> AppResult<Vec<PendingMessage>> {
    requests
        .into_iter()
        .enumerate()
        .map(|(index, scheduled)| {
            let body = serde_json::to_string(&scheduled.request).map_err(|error| {
                AppError::Internal(format!("failed to encode scan request: {error}"))
            })?;
            let delay_seconds = i32::try_from(scheduled.delay_seconds).map_err(|_| {
                AppError::Validation(format!(
                    "scan delay {} does not fit a queue delay",
                    scheduled.delay_seconds
                ))
            })?;

            Ok(PendingMessage {
                id: format!("scan-{index}"),
                body,
                delay_seconds,
            })
        })
        .collect()
}

/// Sends every message, resending only the entries the queue did not accept.
///
/// One retry schedule covers the whole call. A rejection blamed on the sender is
/// not retried.
async fn send_until_accepted<F, Fut>(
    messages: Vec<PendingMessage>,
    policy: BackoffPolicy,
    mut send: F,
) -> AppResult<()>
where
    F: FnMut(Vec<PendingMessage>) -> Fut,
    Fut: Future<Output = Result<Vec<RejectedMessage>, SendError>>,
{
    let mut backoff = policy.start();

    for chunk in messages.chunks(MAX_BATCH_ENTRIES) {
        let mut pending = chunk.to_vec();
        let mut attempt = 1_u32;

        loop {
            let last_error = match send(pending.clone()).await {
                Ok(rejected) if rejected.is_empty() => {
                    debug!(attempt, entries = pending.len(), "scan queue accepted batch");
                    break;
                }
                Ok(rejected) => {
                    if let Some(permanent) = rejected.iter().find(|message| message.sender_fault) {
                        return Err(AppError::Internal(format!(
                            "scan queue rejected message '{}': {}",
                            permanent.id, permanent.reason
                        )));
                    }

                    let reasons: HashMap<&str, &str> = rejected
                        .iter()
                        .map(|message| (message.id.as_str(), message.reason.as_str()))
                        .collect();
                    let summary = format!(
                        "{} of {} entries failed, first: {}",
                        rejected.len(),
                        pending.len(),
                        rejected[0].reason
                    );
                    pending.retain(|message| reasons.contains_key(message.id.as_str()));
                    summary
                }
                Err(SendError::Permanent(message)) => return Err(AppError::Internal(message)),
                Err(SendError::Transient(message)) => message,
            };

            let Some(delay) = backoff.next_delay() else {
                return Err(AppError::Unavailable(format!(
                    "scan queue send retries exhausted after {attempt} attempts within {:?}: {last_error}",
                    policy.max_elapsed()
                )));
            };

            warn!(
                attempt,
                delay_ms = delay.as_millis(),
                error = %last_error,
                "retrying scan queue send"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Mutex;
    use tripwire_application::ScheduledScanRequest;
    use tripwire_core::AppError;
    use tripwire_domain::ScanRequest;

    use super::{
        PendingMessage, RejectedMessage, SendError, pending_messages, send_until_accepted,
    };
    use crate::backoff::BackoffPolicy;

    fn messages(count: usize) -> Vec<PendingMessage> {
        (0..count)
            .map(|index| PendingMessage {
                id: format!("scan-{index}"),
                body: "{}".to_owned(),
                delay_seconds: 0,
            })
            .collect()
    }

    fn rejected(id: &str, sender_fault: bool) -> RejectedMessage {
        RejectedMessage {
            id: id.to_owned(),
            reason: "InternalError: try again".to_owned(),
            sender_fault,
        }
    }

    #[test]
    fn encodes_delay_and_body_per_request() {
        let result = pending_messages(vec![
            ScheduledScanRequest {
                delay_seconds: 0,
                request: ScanRequest::default(),
            },
            ScheduledScanRequest {
                delay_seconds: 120,
                request: ScanRequest::default(),
            },
        ]);

        assert!(result.is_ok());
        let messages = result.unwrap_or_default();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].id, "scan-1");
        assert_eq!(messages[1].delay_seconds, 120);
        assert_eq!(messages[1].body, r#"{"entries":[]}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn sends_in_chunks_of_ten() {
        let sent = Arc::new(Mutex::new(Vec::new()));

        let result = send_until_accepted(messages(23), BackoffPolicy::default(), |batch| {
            let sent = Arc::clone(&sent);
            async move {
                sent.lock().await.push(batch.len());
                Ok(Vec::new())
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(*sent.lock().await, vec![10, 10, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn resends_only_failed_entries() {
        let sent = Arc::new(Mutex::new(Vec::new()));

        let result = send_until_accepted(messages(3), BackoffPolicy::default(), |batch| {
            let sent = Arc::clone(&sent);
            async move {
                let ids: Vec<String> = batch.iter().map(|message| message.id.clone()).collect();
                let mut sent = sent.lock().await;
                sent.push(ids);
                if sent.len() == 1 {
                    Ok(vec![rejected("scan-1", false)])
                } else {
                    Ok(Vec::new())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(
            *sent.lock().await,
            vec![
                vec!["scan-0".to_owned(), "scan-1".to_owned(), "scan-2".to_owned()],
                vec!["scan-1".to_owned()],
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn sender_fault_is_not_retried() {
        let calls = Arc::new(Mutex::new(0_u32));

        let result = send_until_accepted(messages(2), BackoffPolicy::default(), |_| {
            let calls = Arc::clone(&calls);
            async move {
                *calls.lock().await += 1;
                Ok(vec![rejected("scan-0", true)])
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(*calls.lock().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausting_the_budget_fails_the_send() {
        let calls = Arc::new(Mutex::new(0_u32));
        let policy = BackoffPolicy::default().with_max_elapsed(Duration::from_secs(1));

        let result = send_until_accepted(messages(1), policy, |_| {
            let calls = Arc::clone(&calls);
            async move {
                *calls.lock().await += 1;
                Err(SendError::Transient("connection reset".to_owned()))
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::Unavailable(_))));
        // 100 + 200 + 400 ms, then the remaining 300 ms.
        assert_eq!(*calls.lock().await, 5);
    }
}
