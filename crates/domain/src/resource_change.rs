use std::fmt::{Display, Formatter};

use tripwire_core::AccountId;

use crate::{AuditEventMetadata, ResourceType};

/// How much of an account one change asks the scanner to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeScope {
    /// Every resource of the type in every region.
    Account,
    /// Every resource of the type in one region.
    Region,
    /// One resource.
    Resource,
}

/// Identity under which changes are deduplicated within one batch.
///
/// Kept as separate fields rather than a concatenated string so that no
/// combination of id, type and region can collide with another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AggregationKey {
    resource_id: String,
    resource_type: ResourceType,
    region: String,
}

impl AggregationKey {
    /// Returns the resource id part, empty for type scans.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    /// Returns the resource type part.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Returns the region part, empty for account-wide scans.
    #[must_use]
    pub fn region(&self) -> &str {
        self.region.as_str()
    }
}

impl Display for AggregationKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}{}{}",
            self.resource_id, self.resource_type, self.region
        )
    }
}

/// One "rescan or delete this" instruction produced from an audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceChange {
    account_id: AccountId,
    integration_id: String,
    event_name: String,
    event_time: String,
    resource_id: String,
    resource_type: ResourceType,
    region: String,
    delete: bool,
    delay_seconds: u32,
}

impl ResourceChange {
    /// Creates a single-resource update in the event's region.
    #[must_use]
    pub fn resource(
        metadata: &AuditEventMetadata,
        resource_type: ResourceType,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            account_id: metadata.account_id().clone(),
            integration_id: String::new(),
            event_name: metadata.event_name().to_owned(),
            event_time: String::new(),
            resource_id: resource_id.into(),
            resource_type,
            region: metadata.region().to_owned(),
            delete: false,
            delay_seconds: 0,
        }
    }

    /// Creates a scan of every resource of one type in the event's region.
    #[must_use]
    pub fn region_scan(metadata: &AuditEventMetadata, resource_type: ResourceType) -> Self {
        Self::resource(metadata, resource_type, String::new())
    }

    /// Creates a scan of every resource of one type across the account.
    #[must_use]
    pub fn account_scan(metadata: &AuditEventMetadata, resource_type: ResourceType) -> Self {
        Self::resource(metadata, resource_type, String::new()).in_region(String::new())
    }

    /// Marks the change as a deletion.
    #[must_use]
    pub fn deleted(mut self) -> Self {
        self.delete = true;
        self
    }

    /// Marks the change as a deletion when `delete` is true.
    #[must_use]
    pub fn deleted_if(mut self, delete: bool) -> Self {
        self.delete = delete;
        self
    }

    /// Delays the downstream scan by the given number of seconds.
    #[must_use]
    pub fn delayed(mut self, delay_seconds: u32) -> Self {
        self.delay_seconds = delay_seconds;
        self
    }

    /// Overrides the region the change applies to.
    #[must_use]
    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Records the source event time and owning integration.
    pub fn stamp(&mut self, event_time: impl Into<String>, integration_id: impl Into<String>) {
        self.event_time = event_time.into();
        self.integration_id = integration_id.into();
    }

    /// Returns the owning account.
    #[must_use]
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Returns the owning integration, empty until stamped.
    #[must_use]
    pub fn integration_id(&self) -> &str {
        self.integration_id.as_str()
    }

    /// Returns the action that produced the change.
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.event_name.as_str()
    }

    /// Returns the source event timestamp, empty until stamped.
    #[must_use]
    pub fn event_time(&self) -> &str {
        self.event_time.as_str()
    }

    /// Returns the affected resource id, empty for type scans.
    #[must_use]
    pub fn resource_id(&self) -> &str {
        self.resource_id.as_str()
    }

    /// Returns the affected resource type.
    #[must_use]
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Returns the affected region, empty for account-wide scans.
    #[must_use]
    pub fn region(&self) -> &str {
        self.region.as_str()
    }

    /// Returns whether the resource was removed.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.delete
    }

    /// Returns the requested scan delay in seconds.
    #[must_use]
    pub fn delay_seconds(&self) -> u32 {
        self.delay_seconds
    }

    /// Returns how broad the requested scan is.
    #[must_use]
    pub fn scope(&self) -> ChangeScope {
        match (self.resource_id.is_empty(), self.region.is_empty()) {
            (false, _) => ChangeScope::Resource,
            (true, false) => ChangeScope::Region,
            (true, true) => ChangeScope::Account,
        }
    }

    /// Returns the deduplication identity of this change.
    #[must_use]
    pub fn aggregation_key(&self) -> AggregationKey {
        AggregationKey {
            resource_id: self.resource_id.clone(),
            resource_type: self.resource_type,
            region: self.region.clone(),
        }
    }
}
