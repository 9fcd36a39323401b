use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{meta_resource_id, regional_singleton_id};
use super::{Classification, ClassificationRule};

pub(super) struct ConfigRule;

impl ClassificationRule for ConfigRule {
    fn event_source(&self) -> &'static str {
        "config.amazonaws.com"
    }

    fn classify(&self, _detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        if !matches!(
            event_name,
            "DeleteConfigurationRecorder"
                | "DeleteDeliveryChannel"
                | "PutConfigurationRecorder"
                | "PutDeliveryChannel"
                | "StartConfigurationRecorder"
                | "StopConfigurationRecorder"
        ) {
            return Classification::Unmapped;
        }

        // One recorder exists per account and region, so it is addressed by position.
        Classification::Changes(vec![
            ResourceChange::resource(
                metadata,
                ResourceType::ConfigRecorder,
                regional_singleton_id(metadata, ResourceType::ConfigRecorder),
            )
            .deleted_if(event_name == "DeleteConfigurationRecorder"),
            ResourceChange::resource(
                metadata,
                ResourceType::ConfigRecorderMeta,
                meta_resource_id(metadata, ResourceType::ConfigRecorderMeta),
            )
            .in_region(""),
        ])
    }
}
