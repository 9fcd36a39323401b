use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn, arn_resource, is_arn, text};
use super::{Classification, ClassificationRule};

const INSTANCE_IDENTIFIER: &str = "/requestParameters/dBInstanceIdentifier";

pub(super) struct RdsRule;

impl ClassificationRule for RdsRule {
    fn event_source(&self) -> &'static str {
        "rds.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        let instance = match event_name {
            "CreateDBInstance"
            | "CreateDBInstanceReadReplica"
            | "RestoreDBInstanceFromDBSnapshot"
            | "RestoreDBInstanceFromS3" => text(detail, "/responseElements/dBInstanceArn")
                .or_else(|| text(detail, INSTANCE_IDENTIFIER)),
            "RestoreDBInstanceToPointInTime" => text(detail, "/responseElements/dBInstanceArn")
                .or_else(|| text(detail, "/requestParameters/targetDBInstanceIdentifier")),
            "AddRoleToDBInstance"
            | "CreateDBSnapshot"
            | "DeleteDBInstance"
            | "ModifyDBInstance"
            | "PromoteReadReplica"
            | "RebootDBInstance"
            | "RemoveRoleFromDBInstance"
            | "StartDBInstance"
            | "StopDBInstance" => text(detail, INSTANCE_IDENTIFIER),
            "AddTagsToResource" | "RemoveTagsFromResource" => {
                let pointer = "/requestParameters/resourceName";
                let Some(resource_arn) = text(detail, pointer) else {
                    return Classification::missing(pointer);
                };
                let is_instance =
                    arn_resource(resource_arn).is_some_and(|resource| resource.starts_with("db:"));
                if !is_instance {
                    // Tags on snapshots, groups and clusters do not alter instance state.
                    return Classification::Changes(Vec::new());
                }
                Some(resource_arn)
            }
            // Snapshot visibility is reported on the instances; only the snapshot is named.
            "CopyDBSnapshot" | "DeleteDBSnapshot" | "ModifyDBSnapshotAttribute" => {
                return Classification::single(ResourceChange::region_scan(
                    metadata,
                    ResourceType::RdsInstance,
                ));
            }
            _ => return Classification::Unmapped,
        };

        let Some(instance) = instance else {
            return Classification::missing(INSTANCE_IDENTIFIER);
        };

        let instance_arn = if is_arn(instance) {
            instance.to_owned()
        } else {
            arn(metadata, "rds", format!("db:{instance}").as_str())
        };

        Classification::single(
            ResourceChange::resource(metadata, ResourceType::RdsInstance, instance_arn)
                .deleted_if(event_name == "DeleteDBInstance"),
        )
    }
}
