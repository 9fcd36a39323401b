use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn, is_arn, meta_resource_id, text};
use super::{Classification, ClassificationRule};

pub(super) struct CloudTrailRule;

impl ClassificationRule for CloudTrailRule {
    fn event_source(&self) -> &'static str {
        "cloudtrail.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        let pointer = match event_name {
            "CreateTrail" | "UpdateTrail" => {
                if text(detail, "/responseElements/trailARN").is_some() {
                    "/responseElements/trailARN"
                } else {
                    "/requestParameters/name"
                }
            }
            "DeleteTrail" | "PutEventSelectors" | "PutInsightSelectors" | "StartLogging"
            | "StopLogging" => "/requestParameters/name",
            "AddTags" | "RemoveTags" => "/requestParameters/resourceId",
            _ => return Classification::Unmapped,
        };

        let Some(trail) = text(detail, pointer) else {
            return Classification::missing(pointer);
        };

        let trail_arn = if is_arn(trail) {
            trail.to_owned()
        } else {
            arn(metadata, "cloudtrail", format!("trail/{trail}").as_str())
        };

        Classification::Changes(vec![
            ResourceChange::resource(metadata, ResourceType::CloudTrail, trail_arn)
                .deleted_if(event_name == "DeleteTrail"),
            // Account-wide logging coverage is summarized separately.
            ResourceChange::resource(
                metadata,
                ResourceType::CloudTrailMeta,
                meta_resource_id(metadata, ResourceType::CloudTrailMeta),
            )
            .in_region(""),
        ])
    }
}
