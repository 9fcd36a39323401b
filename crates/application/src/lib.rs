//! Application services and ports.

#![forbid(unsafe_code)]

mod account_registry;
mod classification;
mod dispatch_service;
mod envelope;
mod event_filter;
mod event_processor_service;
mod ignore_list;
mod outcome;
mod pipeline_ports;

pub use account_registry::{
    AccountRegistry, DEFAULT_ACCOUNT_REFRESH_INTERVAL, DEFAULT_REGION_CACHE_TTL,
};
pub use classification::{Classification, ClassificationRule, ClassifierRegistry};
pub use dispatch_service::{DispatchService, DispatchSummary};
pub use envelope::{EventEnvelope, decode_envelope};
pub use event_filter::{EventFilter, Extraction};
pub use event_processor_service::EventProcessorService;
pub use outcome::{BatchReport, DropReason, RecordOutcome};
pub use pipeline_ports::{
    AccountDirectory, AuditLogStore, ResourceInventory, ScanQueue, ScheduledScanRequest,
    SubscriptionConfirmer,
};
