use std::sync::Arc;

use tracing::{info, warn};
use tripwire_core::AppResult;
use tripwire_domain::ChangeSet;
use uuid::Uuid;

use crate::account_registry::AccountRegistry;
use crate::classification::ClassifierRegistry;
use crate::dispatch_service::DispatchService;
use crate::envelope::{EventEnvelope, decode_envelope};
use crate::event_filter::EventFilter;
use crate::outcome::{BatchReport, DropReason, RecordOutcome};
use crate::pipeline_ports::{AuditLogStore, SubscriptionConfirmer};

mod records;

/// Path an audit event arrived through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventPath {
    /// Delivered individually, shortly after the call.
    EventStream,
    /// Read from a compressed batch file in the object store.
    ObjectStore,
}

/// Mutable state of one batch.
struct BatchState {
    batch_id: Uuid,
    changes: ChangeSet,
    report: BatchReport,
}

impl BatchState {
    fn new() -> Self {
        let batch_id = Uuid::new_v4();
        Self {
            batch_id,
            changes: ChangeSet::new(),
            report: BatchReport::new(batch_id),
        }
    }
}

/// Turns one batch of inbound messages into deletes and delayed scans.
pub struct EventProcessorService {
    accounts: Arc<AccountRegistry>,
    classifier: ClassifierRegistry,
    filter: EventFilter,
    audit_log_store: Arc<dyn AuditLogStore>,
    subscription_confirmer: Arc<dyn SubscriptionConfirmer>,
    dispatcher: DispatchService,
}

impl EventProcessorService {
    /// Creates a processor with every built-in classification rule.
    #[must_use]
    pub fn new(
        accounts: Arc<AccountRegistry>,
        audit_log_store: Arc<dyn AuditLogStore>,
        subscription_confirmer: Arc<dyn SubscriptionConfirmer>,
        dispatcher: DispatchService,
    ) -> Self {
        let classifier = ClassifierRegistry::aws();
        let filter = EventFilter::for_registry(&classifier);
        Self {
            accounts,
            classifier,
            filter,
            audit_log_store,
            subscription_confirmer,
            dispatcher,
        }
    }

    /// Processes one inbound batch.
    ///
    /// Bad records are logged and skipped. Errors are returned only when a
    /// shared dependency fails, in which case nothing from the batch should
    /// be acknowledged.
    pub async fn process_batch<S>(&self, messages: &[S]) -> AppResult<BatchReport>
    where
        S: AsRef<str>,
    {
        let mut batch = BatchState::new();
        self.accounts.refresh().await?;

        for message in messages {
            self.process_message(message.as_ref(), &mut batch).await?;
        }

        let summary = self.dispatcher.dispatch(&batch.changes).await?;
        batch.report.deletes_sent = summary.deletes_sent;
        batch.report.scan_messages_sent = summary.scan_messages_sent;

        let report = batch.report;
        info!(
            batch_id = %report.batch_id,
            records = report.records_seen,
            classified = report.classified,
            confirmed = report.confirmed,
            soft_dropped = report.soft_dropped,
            superseded = report.superseded,
            failed = report.failed,
            deletes = report.deletes_sent,
            scan_messages = report.scan_messages_sent,
            "processed audit event batch"
        );

        Ok(report)
    }

    async fn process_message(&self, body: &str, batch: &mut BatchState) -> AppResult<()> {
        let envelope = match decode_envelope(body) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => {
                info!(batch_id = %batch.batch_id, "dropping message of unknown shape");
                batch
                    .report
                    .record(&RecordOutcome::SoftDropped(DropReason::UnrecognizedEnvelope));
                return Ok(());
            }
            Err(error) => {
                warn!(batch_id = %batch.batch_id, error = %error, "dropping undecodable message");
                batch
                    .report
                    .record(&RecordOutcome::SoftDropped(DropReason::UnrecognizedEnvelope));
                return Ok(());
            }
        };

        match envelope {
            EventEnvelope::RawAuditEvent(event)
            | EventEnvelope::NotificationWrappedAuditEvent(event) => {
                let outcome = self
                    .handle_event(&event, EventPath::EventStream, batch)
                    .await;
                batch.report.record(&outcome);
            }
            EventEnvelope::BatchAvailableNotification { bucket, key } => {
                self.process_audit_log(&bucket, &key, batch).await?;
            }
            EventEnvelope::SubscriptionConfirmation { topic_arn, token } => {
                let outcome = self.confirm_subscription(&topic_arn, &token, batch).await;
                batch.report.record(&outcome);
            }
        }

        Ok(())
    }

    async fn confirm_subscription(
        &self,
        topic_arn: &str,
        token: &str,
        batch: &BatchState,
    ) -> RecordOutcome {
        match self
            .subscription_confirmer
            .confirm_subscription(topic_arn, token)
            .await
        {
            Ok(()) => {
                info!(batch_id = %batch.batch_id, topic_arn, "confirmed topic subscription");
                RecordOutcome::Confirmed
            }
            Err(error) => {
                warn!(
                    batch_id = %batch.batch_id,
                    topic_arn,
                    error = %error,
                    "failed to confirm topic subscription"
                );
                RecordOutcome::Failed(error.to_string())
            }
        }
    }
}
