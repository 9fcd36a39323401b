//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod account;
mod audit_event;
mod change_set;
mod resource_change;
mod resource_type;
mod scan_request;

pub use account::{MonitoredAccount, ScanConfig};
pub use audit_event::AuditEventMetadata;
pub use change_set::{ChangeSet, MergeOutcome};
pub use resource_change::{AggregationKey, ChangeScope, ResourceChange};
pub use resource_type::ResourceType;
pub use scan_request::{ScanEntry, ScanRequest};
