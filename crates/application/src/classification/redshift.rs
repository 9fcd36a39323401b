use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn, arn_resource, text};
use super::{Classification, ClassificationRule};

const CLUSTER_IDENTIFIER: &str = "/requestParameters/clusterIdentifier";

pub(super) struct RedshiftRule;

impl ClassificationRule for RedshiftRule {
    fn event_source(&self) -> &'static str {
        "redshift.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        match event_name {
            "CreateCluster"
            | "DeleteCluster"
            | "DisableLogging"
            | "DisableSnapshotCopy"
            | "EnableLogging"
            | "EnableSnapshotCopy"
            | "ModifyClusterIamRoles"
            | "ModifyClusterMaintenance"
            | "ModifyClusterSnapshot"
            | "PauseCluster"
            | "RebootCluster"
            | "ResizeCluster"
            | "RestoreFromClusterSnapshot"
            | "ResumeCluster"
            | "RotateEncryptionKey" => {}
            "ModifyCluster" => return modify_cluster(detail, metadata),
            "CreateTags" | "DeleteTags" => return tagged_cluster(detail, metadata),
            // Parameter groups may be shared by any number of clusters.
            "ModifyClusterParameterGroup" | "ResetClusterParameterGroup" => {
                return Classification::single(ResourceChange::region_scan(
                    metadata,
                    ResourceType::RedshiftCluster,
                ));
            }
            _ => return Classification::Unmapped,
        }

        let Some(cluster) = text(detail, CLUSTER_IDENTIFIER) else {
            return Classification::missing(CLUSTER_IDENTIFIER);
        };

        Classification::single(
            cluster_change(metadata, cluster).deleted_if(event_name == "DeleteCluster"),
        )
    }
}

fn cluster_change(metadata: &AuditEventMetadata, cluster: &str) -> ResourceChange {
    ResourceChange::resource(
        metadata,
        ResourceType::RedshiftCluster,
        arn(metadata, "redshift", format!("cluster:{cluster}").as_str()),
    )
}

/// Renaming a cluster removes the old identity and creates the new one.
fn modify_cluster(detail: &Value, metadata: &AuditEventMetadata) -> Classification {
    let Some(cluster) = text(detail, CLUSTER_IDENTIFIER) else {
        return Classification::missing(CLUSTER_IDENTIFIER);
    };

    match text(detail, "/requestParameters/newClusterIdentifier") {
        Some(new_cluster) if new_cluster != cluster => Classification::Changes(vec![
            cluster_change(metadata, cluster).deleted(),
            cluster_change(metadata, new_cluster),
        ]),
        _ => Classification::single(cluster_change(metadata, cluster)),
    }
}

fn tagged_cluster(detail: &Value, metadata: &AuditEventMetadata) -> Classification {
    let pointer = "/requestParameters/resourceName";
    let Some(resource_arn) = text(detail, pointer) else {
        return Classification::missing(pointer);
    };

    match arn_resource(resource_arn).and_then(|resource| resource.strip_prefix("cluster:")) {
        Some(cluster) if !cluster.is_empty() => {
            Classification::single(cluster_change(metadata, cluster))
        }
        _ => Classification::Changes(Vec::new()),
    }
}
