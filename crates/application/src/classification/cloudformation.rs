use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{is_arn, text};
use super::{Classification, ClassificationRule};

/// Drift detection finishes some time after the API call returns.
pub(super) const DRIFT_DETECTION_DELAY_SECONDS: u32 = 120;

pub(super) struct CloudFormationRule;

impl ClassificationRule for CloudFormationRule {
    fn event_source(&self) -> &'static str {
        "cloudformation.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        let delay = match event_name {
            "DetectStackDrift" | "DetectStackResourceDrift" => DRIFT_DETECTION_DELAY_SECONDS,
            "CancelUpdateStack"
            | "ContinueUpdateRollback"
            | "CreateChangeSet"
            | "CreateStack"
            | "DeleteStack"
            | "ExecuteChangeSet"
            | "SetStackPolicy"
            | "UpdateStack"
            | "UpdateTerminationProtection" => 0,
            "DeleteChangeSet" => return Classification::Changes(Vec::new()),
            _ => return Classification::Unmapped,
        };

        // Responses carry the full stack id; requests may only carry the name.
        let stack = text(detail, "/responseElements/stackId")
            .or_else(|| text(detail, "/requestParameters/stackName"));

        let change = match stack {
            Some(stack_id) if is_arn(stack_id) => {
                ResourceChange::resource(metadata, ResourceType::CloudFormationStack, stack_id)
                    .deleted_if(event_name == "DeleteStack")
            }
            _ if event_name == "CreateStack" => {
                return Classification::missing("/responseElements/stackId");
            }
            // Stack ARNs embed a generated id that cannot be derived from the name.
            _ => ResourceChange::region_scan(metadata, ResourceType::CloudFormationStack),
        };

        Classification::single(change.delayed(delay))
    }
}
