use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{meta_resource_id, regional_singleton_id};
use super::{Classification, ClassificationRule};

pub(super) struct GuardDutyRule;

impl ClassificationRule for GuardDutyRule {
    fn event_source(&self) -> &'static str {
        "guardduty.amazonaws.com"
    }

    fn classify(&self, _detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        if !matches!(
            event_name,
            "AcceptAdministratorInvitation"
                | "AcceptInvitation"
                | "CreateDetector"
                | "CreateFilter"
                | "CreateIPSet"
                | "CreateMembers"
                | "CreatePublishingDestination"
                | "CreateThreatIntelSet"
                | "DeleteDetector"
                | "DeleteFilter"
                | "DeleteIPSet"
                | "DeleteMembers"
                | "DeletePublishingDestination"
                | "DeleteThreatIntelSet"
                | "DisassociateFromAdministratorAccount"
                | "DisassociateFromMasterAccount"
                | "DisassociateMembers"
                | "InviteMembers"
                | "StartMonitoringMembers"
                | "StopMonitoringMembers"
                | "TagResource"
                | "UntagResource"
                | "UpdateDetector"
                | "UpdateFilter"
                | "UpdateIPSet"
                | "UpdateMalwareScanSettings"
                | "UpdateMemberDetectors"
                | "UpdatePublishingDestination"
                | "UpdateThreatIntelSet"
        ) {
            return Classification::Unmapped;
        }

        // A region holds at most one detector, so its id is positional.
        Classification::Changes(vec![
            ResourceChange::resource(
                metadata,
                ResourceType::GuardDutyDetector,
                regional_singleton_id(metadata, ResourceType::GuardDutyDetector),
            )
            .deleted_if(event_name == "DeleteDetector"),
            ResourceChange::resource(
                metadata,
                ResourceType::GuardDutyDetectorMeta,
                meta_resource_id(metadata, ResourceType::GuardDutyDetectorMeta),
            )
            .in_region(""),
        ])
    }
}
