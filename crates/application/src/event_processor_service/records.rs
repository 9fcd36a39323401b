use serde_json::Value;
use tracing::{debug, error, info, warn};
use tripwire_core::AppResult;
use tripwire_domain::MergeOutcome;

use crate::classification::Classification;
use crate::event_filter::Extraction;
use crate::outcome::{DropReason, RecordOutcome};

use super::{BatchState, EventPath, EventProcessorService};

impl EventProcessorService {
    /// Reads one batch file and handles every audit event in it.
    ///
    /// The read itself is batch-fatal; a bad line only skips that line.
    pub(super) async fn process_audit_log(
        &self,
        bucket: &str,
        key: &str,
        batch: &mut BatchState,
    ) -> AppResult<()> {
        let contents = self.audit_log_store.fetch_audit_log(bucket, key).await?;
        debug!(
            batch_id = %batch.batch_id,
            bucket,
            key,
            bytes = contents.len(),
            "read audit log object"
        );

        for (index, line) in contents.split(|byte| *byte == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let value: Value = match serde_json::from_slice(line) {
                Ok(value) => value,
                Err(error) => {
                    warn!(
                        batch_id = %batch.batch_id,
                        bucket,
                        key,
                        line = index + 1,
                        error = %error,
                        "skipping undecodable audit log line"
                    );
                    batch.report.record(&RecordOutcome::Failed(error.to_string()));
                    continue;
                }
            };

            // Delivered trail files hold one document with a `Records` array.
            let events: Vec<&Value> = match value.get("Records").and_then(Value::as_array) {
                Some(records) => records.iter().collect(),
                None => vec![&value],
            };
            for event in events {
                let outcome = self.handle_event(event, EventPath::ObjectStore, batch).await;
                batch.report.record(&outcome);
            }
        }

        Ok(())
    }

    /// Filters, scopes and classifies one audit event, merging its changes
    /// into the batch.
    pub(super) async fn handle_event(
        &self,
        event: &Value,
        path: EventPath,
        batch: &mut BatchState,
    ) -> RecordOutcome {
        let event_name = event.get("eventName").and_then(Value::as_str);
        let event_source = event.get("eventSource").and_then(Value::as_str);
        let metadata = match self.filter.extract(event) {
            Ok(Extraction::Classifiable(metadata)) => metadata,
            Ok(Extraction::Dropped(reason)) => {
                debug!(
                    batch_id = %batch.batch_id,
                    event_name,
                    reason = %reason,
                    "dropping audit event"
                );
                return RecordOutcome::SoftDropped(reason);
            }
            Err(error) => {
                error!(
                    batch_id = %batch.batch_id,
                    event_name,
                    event_source,
                    error = %error,
                    "failed to extract audit event metadata"
                );
                return RecordOutcome::Failed(error.to_string());
            }
        };

        let account_id = metadata.account_id();
        let region = metadata.region();
        match path {
            EventPath::EventStream => {
                self.accounts
                    .mark_event_driven_region(account_id, region)
                    .await;
            }
            EventPath::ObjectStore => {
                if self.accounts.is_event_driven_region(account_id, region).await {
                    debug!(
                        batch_id = %batch.batch_id,
                        account_id = %account_id,
                        region,
                        event_name = metadata.event_name(),
                        "batch file event already covered by event stream"
                    );
                    return RecordOutcome::SoftDropped(DropReason::CoveredByEventStream);
                }
            }
        }

        let Some(account) = self.accounts.lookup(account_id).await else {
            debug!(
                batch_id = %batch.batch_id,
                account_id = %account_id,
                event_name = metadata.event_name(),
                "dropping audit event for unmonitored account"
            );
            return RecordOutcome::SoftDropped(DropReason::UnmonitoredAccount);
        };

        match self
            .classifier
            .classify(event, &metadata, account.integration_id())
        {
            Classification::Changes(changes) => {
                let mut kept = 0;
                for change in changes {
                    if account.scan_config().excludes(&change) {
                        debug!(
                            batch_id = %batch.batch_id,
                            account_id = %account_id,
                            region = change.region(),
                            resource_type = %change.resource_type(),
                            "change excluded by account scan configuration"
                        );
                        continue;
                    }
                    if batch.changes.merge(change) != MergeOutcome::Inserted {
                        batch.report.superseded += 1;
                    }
                    kept += 1;
                }
                RecordOutcome::Classified(kept)
            }
            Classification::Unmapped => {
                info!(
                    batch_id = %batch.batch_id,
                    account_id = %account_id,
                    event_source = metadata.event_source(),
                    event_name = metadata.event_name(),
                    "no classification for supported service action"
                );
                RecordOutcome::SoftDropped(DropReason::UnmappedAction)
            }
            Classification::Malformed(reason) => {
                error!(
                    batch_id = %batch.batch_id,
                    account_id = %account_id,
                    event_source = metadata.event_source(),
                    event_name = metadata.event_name(),
                    region,
                    reason = reason.as_str(),
                    "failed to classify audit event"
                );
                RecordOutcome::Failed(reason)
            }
        }
    }
}
