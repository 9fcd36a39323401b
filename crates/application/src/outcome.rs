use std::fmt::{Display, Formatter};

use uuid::Uuid;

/// Why a record was intentionally left unprocessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// The action is on the static ignore list or matches an ignored prefix.
    IgnoredAction,
    /// The event is flagged read-only.
    ReadOnly,
    /// The call failed and changed nothing.
    FailedCall,
    /// No classification rule exists for the service.
    UnsupportedService,
    /// The service is supported but the action has no mapping.
    UnmappedAction,
    /// The account is not registered for scanning.
    UnmonitoredAccount,
    /// A batch-file record for a region the event stream already covers.
    CoveredByEventStream,
    /// The message matched no known envelope shape.
    UnrecognizedEnvelope,
}

impl DropReason {
    /// Returns a stable label for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IgnoredAction => "ignored_action",
            Self::ReadOnly => "read_only",
            Self::FailedCall => "failed_call",
            Self::UnsupportedService => "unsupported_service",
            Self::UnmappedAction => "unmapped_action",
            Self::UnmonitoredAccount => "unmonitored_account",
            Self::CoveredByEventStream => "covered_by_event_stream",
            Self::UnrecognizedEnvelope => "unrecognized_envelope",
        }
    }
}

impl Display for DropReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Result of handling one audit event or control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The event produced this many resource changes (possibly zero).
    Classified(usize),
    /// A subscription handshake was confirmed.
    Confirmed,
    /// The record was expected traffic that needs no action.
    SoftDropped(DropReason),
    /// The record could not be handled; the batch continues.
    Failed(String),
}

/// Counters for one processed batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Correlation id used in every log line of the batch.
    pub batch_id: Uuid,
    /// Audit events and control messages examined.
    pub records_seen: usize,
    /// Records that reached a classification rule.
    pub classified: usize,
    /// Subscription handshakes confirmed.
    pub confirmed: usize,
    /// Records dropped as expected traffic.
    pub soft_dropped: usize,
    /// Changes discarded because the batch held a newer one for the same resource.
    pub superseded: usize,
    /// Records skipped because of bad data.
    pub failed: usize,
    /// Resource ids sent to the inventory for deletion.
    pub deletes_sent: usize,
    /// Scan request messages sent to the work queue.
    pub scan_messages_sent: usize,
}

impl BatchReport {
    /// Creates an empty report for a new batch.
    #[must_use]
    pub fn new(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            records_seen: 0,
            classified: 0,
            confirmed: 0,
            soft_dropped: 0,
            superseded: 0,
            failed: 0,
            deletes_sent: 0,
            scan_messages_sent: 0,
        }
    }

    /// Counts one record outcome.
    pub fn record(&mut self, outcome: &RecordOutcome) {
        self.records_seen += 1;
        match outcome {
            RecordOutcome::Classified(_) => self.classified += 1,
            RecordOutcome::Confirmed => self.confirmed += 1,
            RecordOutcome::SoftDropped(_) => self.soft_dropped += 1,
            RecordOutcome::Failed(_) => self.failed += 1,
        }
    }
}
