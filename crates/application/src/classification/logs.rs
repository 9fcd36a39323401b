use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn, text};
use super::{Classification, ClassificationRule};

pub(super) struct LogsRule;

impl ClassificationRule for LogsRule {
    fn event_source(&self) -> &'static str {
        "logs.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        if !matches!(
            event_name,
            "AssociateKmsKey"
                | "CreateLogGroup"
                | "DeleteLogGroup"
                | "DeleteMetricFilter"
                | "DeleteRetentionPolicy"
                | "DeleteSubscriptionFilter"
                | "DisassociateKmsKey"
                | "PutMetricFilter"
                | "PutRetentionPolicy"
                | "PutSubscriptionFilter"
                | "TagLogGroup"
                | "UntagLogGroup"
        ) {
            return Classification::Unmapped;
        }

        let pointer = "/requestParameters/logGroupName";
        let Some(log_group) = text(detail, pointer) else {
            return Classification::missing(pointer);
        };

        Classification::single(
            ResourceChange::resource(
                metadata,
                ResourceType::CloudWatchLogGroup,
                arn(metadata, "logs", format!("log-group:{log_group}").as_str()),
            )
            .deleted_if(event_name == "DeleteLogGroup"),
        )
    }
}
