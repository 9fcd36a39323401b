use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn, arn_resource, is_arn, text};
use super::{Classification, ClassificationRule};

/// Cluster used by the API when a request names none.
const DEFAULT_CLUSTER: &str = "default";

pub(super) struct EcsRule;

impl ClassificationRule for EcsRule {
    fn event_source(&self) -> &'static str {
        "ecs.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        let cluster = match event_name {
            "CreateCluster" => text(detail, "/responseElements/cluster/clusterArn")
                .or_else(|| text(detail, "/requestParameters/clusterName"))
                .unwrap_or(DEFAULT_CLUSTER),
            "DeleteCluster" | "PutClusterCapacityProviders" | "UpdateCluster"
            | "UpdateClusterSettings" => {
                let pointer = "/requestParameters/cluster";
                let Some(cluster) = text(detail, pointer) else {
                    return Classification::missing(pointer);
                };
                cluster
            }
            "CreateService"
            | "CreateTaskSet"
            | "DeleteService"
            | "DeleteTaskSet"
            | "DeregisterContainerInstance"
            | "RegisterContainerInstance"
            | "RunTask"
            | "StartTask"
            | "StopTask"
            | "UpdateContainerAgent"
            | "UpdateContainerInstancesState"
            | "UpdateService"
            | "UpdateServicePrimaryTaskSet"
            | "UpdateTaskSet" => {
                text(detail, "/requestParameters/cluster").unwrap_or(DEFAULT_CLUSTER)
            }
            "TagResource" | "UntagResource" => return tagged_resource(detail, metadata),
            _ => return Classification::Unmapped,
        };

        Classification::single(
            ResourceChange::resource(
                metadata,
                ResourceType::EcsCluster,
                cluster_arn(metadata, cluster),
            )
            .deleted_if(event_name == "DeleteCluster"),
        )
    }
}

fn cluster_arn(metadata: &AuditEventMetadata, cluster: &str) -> String {
    if is_arn(cluster) {
        cluster.to_owned()
    } else {
        arn(metadata, "ecs", format!("cluster/{cluster}").as_str())
    }
}

/// Tags may land on a cluster or on anything scoped inside one.
fn tagged_resource(detail: &Value, metadata: &AuditEventMetadata) -> Classification {
    let pointer = "/requestParameters/resourceArn";
    let Some(resource_arn) = text(detail, pointer) else {
        return Classification::missing(pointer);
    };

    let Some(resource) = arn_resource(resource_arn) else {
        return Classification::Malformed(format!("resource '{resource_arn}' is not an ARN"));
    };

    let segments: Vec<&str> = resource.split('/').collect();
    let cluster = match segments.as_slice() {
        ["cluster", name] => Some(*name),
        ["service" | "task" | "container-instance" | "task-set", name, ..]
            if segments.len() > 2 =>
        {
            Some(*name)
        }
        ["task-definition", ..] | ["capacity-provider", ..] => {
            return Classification::Changes(Vec::new());
        }
        _ => None,
    };

    Classification::single(match cluster.filter(|name| !name.is_empty()) {
        Some(name) => ResourceChange::resource(
            metadata,
            ResourceType::EcsCluster,
            cluster_arn(metadata, name),
        ),
        // Old-format ARNs omit the cluster.
        None => ResourceChange::region_scan(metadata, ResourceType::EcsCluster),
    })
}
