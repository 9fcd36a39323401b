mod audit_log_store;
mod directory;
mod inventory;
mod scan_queue;
mod subscription;

pub use audit_log_store::AuditLogStore;
pub use directory::AccountDirectory;
pub use inventory::ResourceInventory;
pub use scan_queue::{ScanQueue, ScheduledScanRequest};
pub use subscription::SubscriptionConfirmer;
