use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn, arn_resource, text};
use super::{Classification, ClassificationRule};

/// Cluster provisioning and version upgrades run long after the call returns.
pub(super) const CLUSTER_SETTLE_DELAY_SECONDS: u32 = 300;

pub(super) struct EksRule;

impl ClassificationRule for EksRule {
    fn event_source(&self) -> &'static str {
        "eks.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        let (pointer, delay) = match event_name {
            "CreateCluster" => {
                if let Some(cluster_arn) = text(detail, "/responseElements/cluster/arn") {
                    return Classification::single(
                        ResourceChange::resource(metadata, ResourceType::EksCluster, cluster_arn)
                            .delayed(CLUSTER_SETTLE_DELAY_SECONDS),
                    );
                }
                ("/requestParameters/name", CLUSTER_SETTLE_DELAY_SECONDS)
            }
            "UpdateClusterConfig" | "UpdateClusterVersion" => {
                ("/requestParameters/name", CLUSTER_SETTLE_DELAY_SECONDS)
            }
            "DeleteCluster" => ("/requestParameters/name", 0),
            "AssociateEncryptionConfig"
            | "AssociateIdentityProviderConfig"
            | "CreateAddon"
            | "CreateFargateProfile"
            | "CreateNodegroup"
            | "DeleteAddon"
            | "DeleteFargateProfile"
            | "DeleteNodegroup"
            | "DisassociateIdentityProviderConfig"
            | "UpdateAddon"
            | "UpdateNodegroupConfig"
            | "UpdateNodegroupVersion" => ("/requestParameters/name", 0),
            "TagResource" | "UntagResource" => return tagged_cluster(detail, metadata),
            _ => return Classification::Unmapped,
        };

        let Some(cluster_name) = text(detail, pointer) else {
            return Classification::missing(pointer);
        };

        Classification::single(
            ResourceChange::resource(
                metadata,
                ResourceType::EksCluster,
                arn(metadata, "eks", format!("cluster/{cluster_name}").as_str()),
            )
            .deleted_if(event_name == "DeleteCluster")
            .delayed(delay),
        )
    }
}

/// Nodegroup, addon and profile ARNs name their cluster as the second segment.
fn tagged_cluster(detail: &Value, metadata: &AuditEventMetadata) -> Classification {
    let pointer = "/requestParameters/resourceArn";
    let Some(resource_arn) = text(detail, pointer) else {
        return Classification::missing(pointer);
    };

    let cluster_name = arn_resource(resource_arn)
        .and_then(|resource| resource.split('/').nth(1))
        .filter(|name| !name.is_empty());
    let Some(cluster_name) = cluster_name else {
        return Classification::Malformed(format!(
            "resource '{resource_arn}' does not name an EKS cluster"
        ));
    };

    Classification::single(ResourceChange::resource(
        metadata,
        ResourceType::EksCluster,
        arn(metadata, "eks", format!("cluster/{cluster_name}").as_str()),
    ))
}
