use aws_sdk_sqs::Client as SqsClient;
use aws_sdk_sqs::types::DeleteMessageBatchRequestEntry;
use tracing::{debug, warn};
use tripwire_core::{AppError, AppResult};

/// One received message and the handle needed to delete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Raw message body.
    pub body: String,
    /// Receipt handle for acknowledging the message.
    pub receipt_handle: String,
}

/// Long-polling consumer of the inbound audit event queue.
pub struct SqsInboundQueue {
    client: SqsClient,
    queue_url: String,
    batch_size: i32,
    wait_time_seconds: i32,
}

impl SqsInboundQueue {
    /// Creates a consumer for the given queue.
    #[must_use]
    pub fn new(
        client: SqsClient,
        queue_url: impl Into<String>,
        batch_size: i32,
        wait_time_seconds: i32,
    ) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
            batch_size,
            wait_time_seconds,
        }
    }

    /// Waits for the next batch of messages; an empty batch means the poll timed out.
    pub async fn receive(&self) -> AppResult<Vec<InboundMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(self.queue_url.as_str())
            .max_number_of_messages(self.batch_size)
            .wait_time_seconds(self.wait_time_seconds)
            .send()
            .await
            .map_err(|error| {
                AppError::Unavailable(format!("failed to receive inbound messages: {error}"))
            })?;

        let messages = output
            .messages()
            .iter()
            .filter_map(|message| {
                let receipt_handle = message.receipt_handle()?;
                Some(InboundMessage {
                    body: message.body().unwrap_or_default().to_owned(),
                    receipt_handle: receipt_handle.to_owned(),
                })
            })
            .collect::<Vec<_>>();

        debug!(messages = messages.len(), "received inbound messages");
        Ok(messages)
    }

    /// Deletes processed messages so they are not redelivered.
    pub async fn acknowledge(&self, messages: &[InboundMessage]) -> AppResult<()> {
        for chunk in messages.chunks(10) {
            let entries = chunk
                .iter()
                .enumerate()
                .map(|(index, message)| {
                    DeleteMessageBatchRequestEntry::builder()
                        .id(format!("ack-{index}"))
                        .receipt_handle(message.receipt_handle.as_str())
                        .build()
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build delete entry: {error}"))
                })?;

            let output = self
                .client
                .delete_message_batch()
                .queue_url(self.queue_url.as_str())
                .set_entries(Some(entries))
                .send()
                .await
                .map_err(|error| {
                    AppError::Unavailable(format!("failed to delete inbound messages: {error}"))
                })?;

            // Undeleted messages reappear after the visibility timeout and are reprocessed.
            for failure in output.failed() {
                warn!(
                    entry_id = failure.id(),
                    code = failure.code(),
                    message = failure.message().unwrap_or("no message"),
                    "failed to delete inbound message"
                );
            }
        }

        Ok(())
    }
}
