use serde::{Deserialize, Serialize};
use tripwire_core::{AccountId, AppResult, NonEmptyString};

use crate::ResourceChange;

/// Per-account scan settings owned by the integration directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    /// Regions the account owner excluded from scanning.
    pub region_ignore_list: Vec<String>,
    /// Resource type tags the account owner excluded from scanning.
    pub resource_type_ignore_list: Vec<String>,
}

impl ScanConfig {
    /// Returns whether the account excludes the change's region or type.
    ///
    /// Account-wide changes carry no region and are never excluded by region.
    #[must_use]
    pub fn excludes(&self, change: &ResourceChange) -> bool {
        let region_excluded = !change.region().is_empty()
            && self
                .region_ignore_list
                .iter()
                .any(|region| region == change.region());
        let type_excluded = self
            .resource_type_ignore_list
            .iter()
            .any(|resource_type| resource_type == change.resource_type().as_str());

        region_excluded || type_excluded
    }
}

/// One cloud account registered for event-driven rescans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredAccount {
    account_id: AccountId,
    integration_id: NonEmptyString,
    scan_config: ScanConfig,
}

impl MonitoredAccount {
    /// Creates a monitored account record.
    pub fn new(
        account_id: AccountId,
        integration_id: impl Into<String>,
        scan_config: ScanConfig,
    ) -> AppResult<Self> {
        Ok(Self {
            account_id,
            integration_id: NonEmptyString::new(integration_id)?,
            scan_config,
        })
    }

    /// Returns the cloud account id.
    #[must_use]
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Returns the opaque integration id.
    #[must_use]
    pub fn integration_id(&self) -> &str {
        self.integration_id.as_str()
    }

    /// Returns the scan settings.
    #[must_use]
    pub fn scan_config(&self) -> &ScanConfig {
        &self.scan_config
    }
}
