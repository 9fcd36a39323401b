//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod backoff;
mod http_account_directory;
mod http_resource_inventory;
mod s3_audit_log_store;
mod sns_subscription_confirmer;
mod sqs_inbound_queue;
mod sqs_scan_queue;

pub use backoff::{
    Backoff, BackoffPolicy, DEFAULT_INITIAL_INTERVAL, DEFAULT_MAX_ELAPSED, DEFAULT_MAX_INTERVAL,
};
pub use http_account_directory::HttpAccountDirectory;
pub use http_resource_inventory::HttpResourceInventory;
pub use s3_audit_log_store::S3AuditLogStore;
pub use sns_subscription_confirmer::SnsSubscriptionConfirmer;
pub use sqs_inbound_queue::{InboundMessage, SqsInboundQueue};
pub use sqs_scan_queue::SqsScanQueue;
