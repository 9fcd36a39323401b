use serde::{Deserialize, Serialize};

use crate::{ChangeScope, ResourceChange, ResourceType};

/// One scan instruction inside a queued scan request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEntry {
    /// Account the scan runs against.
    pub aws_account_id: String,
    /// Integration that owns the account.
    pub integration_id: String,
    /// Single resource to scan; absent for type scans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    /// Region to scan; absent for account-wide scans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Resource type to scan.
    pub resource_type: ResourceType,
    /// Whether every resource type should be scanned.
    pub scan_all_resources: bool,
}

impl From<&ResourceChange> for ScanEntry {
    fn from(change: &ResourceChange) -> Self {
        let (resource_id, region) = match change.scope() {
            ChangeScope::Resource => (
                Some(change.resource_id().to_owned()),
                non_empty(change.region()),
            ),
            ChangeScope::Region => (None, Some(change.region().to_owned())),
            ChangeScope::Account => (None, None),
        };

        Self {
            aws_account_id: change.account_id().as_str().to_owned(),
            integration_id: change.integration_id().to_owned(),
            resource_id,
            region,
            resource_type: change.resource_type(),
            scan_all_resources: false,
        }
    }
}

/// Message body sent to the scan work queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    /// Scan instructions carried by this message.
    pub entries: Vec<ScanEntry>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}
