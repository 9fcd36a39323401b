use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{info, warn};
use tripwire_core::AppResult;
use tripwire_domain::{ChangeSet, ScanEntry, ScanRequest};

use crate::pipeline_ports::{ResourceInventory, ScanQueue, ScheduledScanRequest};

/// What one dispatch cycle sent downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Resource ids sent for deletion.
    pub deletes_sent: usize,
    /// Scan request messages sent.
    pub scan_messages_sent: usize,
}

/// Sends the aggregated changes of one batch to the inventory and the scan queue.
pub struct DispatchService {
    inventory: Arc<dyn ResourceInventory>,
    scan_queue: Arc<dyn ScanQueue>,
}

impl DispatchService {
    /// Creates a new dispatch service.
    #[must_use]
    pub fn new(inventory: Arc<dyn ResourceInventory>, scan_queue: Arc<dyn ScanQueue>) -> Self {
        Self {
            inventory,
            scan_queue,
        }
    }

    /// Deletes removed resources in one call, then queues one scan request
    /// per distinct delay. Either failure aborts the batch.
    pub async fn dispatch(&self, changes: &ChangeSet) -> AppResult<DispatchSummary> {
        if changes.is_empty() {
            return Ok(DispatchSummary::default());
        }

        let mut delete_ids = BTreeSet::new();
        let mut scans_by_delay: BTreeMap<u32, Vec<ScanEntry>> = BTreeMap::new();
        for change in changes.iter() {
            if !change.is_delete() {
                scans_by_delay
                    .entry(change.delay_seconds())
                    .or_default()
                    .push(ScanEntry::from(change));
                continue;
            }

            if change.resource_id().is_empty() {
                warn!(
                    account_id = %change.account_id(),
                    event_name = change.event_name(),
                    resource_type = %change.resource_type(),
                    "skipping delete without a resource id"
                );
                continue;
            }
            delete_ids.insert(change.resource_id().to_owned());
        }

        let mut summary = DispatchSummary::default();
        if !delete_ids.is_empty() {
            summary.deletes_sent = delete_ids.len();
            self.inventory
                .delete_resources(delete_ids.into_iter().collect())
                .await?;
        }

        if !scans_by_delay.is_empty() {
            let requests: Vec<ScheduledScanRequest> = scans_by_delay
                .into_iter()
                .map(|(delay_seconds, entries)| ScheduledScanRequest {
                    delay_seconds,
                    request: ScanRequest { entries },
                })
                .collect();
            summary.scan_messages_sent = requests.len();
            self.scan_queue.send_scan_requests(requests).await?;
        }

        info!(
            deletes = summary.deletes_sent,
            scan_messages = summary.scan_messages_sent,
            "dispatched resource changes"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests;
