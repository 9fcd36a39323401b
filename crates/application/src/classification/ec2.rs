use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{field_list, partition, text};
use super::{Classification, ClassificationRule};

/// Where an EC2 action names the resource it touched.
#[derive(Debug, Clone, Copy)]
enum Target {
    /// One id at a JSON pointer.
    Id(&'static str),
    /// One id at a JSON pointer; a region-wide scan when the caller addressed
    /// the resource another way (for example by group name).
    IdOrRegion(&'static str),
    /// An id field on every item of an array.
    Items(&'static str, &'static str),
    /// The payload never names the resource precisely enough.
    Region,
}

struct Ec2Action {
    resource_type: ResourceType,
    target: Target,
    delete: bool,
}

const fn update(resource_type: ResourceType, target: Target) -> Option<Ec2Action> {
    Some(Ec2Action {
        resource_type,
        target,
        delete: false,
    })
}

const fn delete(resource_type: ResourceType, target: Target) -> Option<Ec2Action> {
    Some(Ec2Action {
        resource_type,
        target,
        delete: true,
    })
}

fn ec2_action(event_name: &str) -> Option<Ec2Action> {
    use ResourceType::{Ec2Ami, Ec2Instance, Ec2NetworkAcl, Ec2SecurityGroup, Ec2Volume, Ec2Vpc};

    const REQUEST_INSTANCES: Target =
        Target::Items("/requestParameters/instancesSet/items", "instanceId");

    match event_name {
        "RunInstances" => update(
            Ec2Instance,
            Target::Items("/responseElements/instancesSet/items", "instanceId"),
        ),
        "TerminateInstances" => delete(Ec2Instance, REQUEST_INSTANCES),
        "MonitorInstances" | "RebootInstances" | "StartInstances" | "StopInstances"
        | "UnmonitorInstances" => update(Ec2Instance, REQUEST_INSTANCES),
        "AssociateIamInstanceProfile"
        | "ModifyInstanceAttribute"
        | "ModifyInstanceMetadataOptions"
        | "ModifyInstancePlacement" => {
            update(Ec2Instance, Target::Id("/requestParameters/instanceId"))
        }
        "DisassociateIamInstanceProfile" | "ReplaceIamInstanceProfileAssociation" => update(
            Ec2Instance,
            Target::IdOrRegion("/responseElements/iamInstanceProfileAssociation/instanceId"),
        ),

        "CreateVolume" => update(Ec2Volume, Target::Id("/responseElements/volumeId")),
        "DeleteVolume" => delete(Ec2Volume, Target::Id("/requestParameters/volumeId")),
        "ModifyVolume" => update(
            Ec2Volume,
            Target::Id("/requestParameters/ModifyVolumeRequest/VolumeId"),
        ),
        "DisableEbsEncryptionByDefault" | "EnableEbsEncryptionByDefault" => {
            update(Ec2Volume, Target::Region)
        }

        "CreateSecurityGroup" => update(Ec2SecurityGroup, Target::Id("/responseElements/groupId")),
        "DeleteSecurityGroup" => delete(
            Ec2SecurityGroup,
            Target::IdOrRegion("/requestParameters/groupId"),
        ),
        "AuthorizeSecurityGroupEgress"
        | "AuthorizeSecurityGroupIngress"
        | "ModifySecurityGroupRules"
        | "RevokeSecurityGroupEgress"
        | "RevokeSecurityGroupIngress"
        | "UpdateSecurityGroupRuleDescriptionsEgress"
        | "UpdateSecurityGroupRuleDescriptionsIngress" => update(
            Ec2SecurityGroup,
            Target::IdOrRegion("/requestParameters/groupId"),
        ),

        "CreateNetworkAcl" => update(
            Ec2NetworkAcl,
            Target::Id("/responseElements/networkAcl/networkAclId"),
        ),
        "DeleteNetworkAcl" => delete(
            Ec2NetworkAcl,
            Target::Id("/requestParameters/networkAclId"),
        ),
        "CreateNetworkAclEntry" | "DeleteNetworkAclEntry" | "ReplaceNetworkAclEntry" => update(
            Ec2NetworkAcl,
            Target::Id("/requestParameters/networkAclId"),
        ),
        // The previously associated ACL is not named in the event.
        "ReplaceNetworkAclAssociation" => update(Ec2NetworkAcl, Target::Region),

        "CreateDefaultVpc" | "CreateVpc" => {
            update(Ec2Vpc, Target::Id("/responseElements/vpc/vpcId"))
        }
        "DeleteVpc" => delete(Ec2Vpc, Target::Id("/requestParameters/vpcId")),
        "AssociateVpcCidrBlock" | "ModifyVpcAttribute" | "ModifyVpcTenancy" => {
            update(Ec2Vpc, Target::Id("/requestParameters/vpcId"))
        }
        "CreateFlowLogs" | "DeleteFlowLogs" | "DisassociateVpcCidrBlock" => {
            update(Ec2Vpc, Target::Region)
        }

        "CopyImage" | "CreateImage" | "RegisterImage" => {
            update(Ec2Ami, Target::Id("/responseElements/imageId"))
        }
        "DeregisterImage" => delete(Ec2Ami, Target::Id("/requestParameters/imageId")),
        "ModifyImageAttribute" | "ResetImageAttribute" => {
            update(Ec2Ami, Target::Id("/requestParameters/imageId"))
        }
        _ => None,
    }
}

/// Maps an EC2 id to its resource type by prefix.
fn type_for_id(resource_id: &str) -> Option<ResourceType> {
    let (prefix, _) = resource_id.split_once('-')?;
    match prefix {
        "i" => Some(ResourceType::Ec2Instance),
        "vol" => Some(ResourceType::Ec2Volume),
        "sg" => Some(ResourceType::Ec2SecurityGroup),
        "acl" => Some(ResourceType::Ec2NetworkAcl),
        "vpc" => Some(ResourceType::Ec2Vpc),
        "ami" => Some(ResourceType::Ec2Ami),
        _ => None,
    }
}

fn ec2_arn(metadata: &AuditEventMetadata, resource_type: ResourceType, id: &str) -> String {
    let region = metadata.region();
    let partition = partition(region);
    let account = metadata.account_id();
    match resource_type {
        // Image ARNs carry no account.
        ResourceType::Ec2Ami => format!("arn:{partition}:ec2:{region}::image/{id}"),
        ResourceType::Ec2Volume => format!("arn:{partition}:ec2:{region}:{account}:volume/{id}"),
        ResourceType::Ec2SecurityGroup => {
            format!("arn:{partition}:ec2:{region}:{account}:security-group/{id}")
        }
        ResourceType::Ec2NetworkAcl => {
            format!("arn:{partition}:ec2:{region}:{account}:network-acl/{id}")
        }
        ResourceType::Ec2Vpc => format!("arn:{partition}:ec2:{region}:{account}:vpc/{id}"),
        _ => format!("arn:{partition}:ec2:{region}:{account}:instance/{id}"),
    }
}

pub(super) struct Ec2Rule;

impl ClassificationRule for Ec2Rule {
    fn event_source(&self) -> &'static str {
        "ec2.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        match metadata.event_name() {
            "CreateTags" | "DeleteTags" => return tagged_resources(detail, metadata),
            "AttachVolume" | "DetachVolume" => return volume_attachment(detail, metadata),
            _ => {}
        }

        let Some(action) = ec2_action(metadata.event_name()) else {
            return Classification::Unmapped;
        };

        let resource = |id: &str| {
            ResourceChange::resource(
                metadata,
                action.resource_type,
                ec2_arn(metadata, action.resource_type, id),
            )
            .deleted_if(action.delete)
        };

        match action.target {
            Target::Id(pointer) => match text(detail, pointer) {
                Some(id) => Classification::single(resource(id)),
                None => Classification::missing(pointer),
            },
            Target::IdOrRegion(pointer) => Classification::single(match text(detail, pointer) {
                Some(id) => resource(id),
                None => ResourceChange::region_scan(metadata, action.resource_type),
            }),
            Target::Items(pointer, field) => {
                let ids = field_list(detail, pointer, field);
                if ids.is_empty() {
                    return Classification::missing(pointer);
                }
                Classification::Changes(ids.into_iter().map(resource).collect())
            }
            Target::Region => Classification::single(ResourceChange::region_scan(
                metadata,
                action.resource_type,
            )),
        }
    }
}

fn tagged_resources(detail: &Value, metadata: &AuditEventMetadata) -> Classification {
    let changes = field_list(detail, "/requestParameters/resourcesSet/items", "resourceId")
        .into_iter()
        .filter_map(|id| {
            let resource_type = type_for_id(id)?;
            Some(ResourceChange::resource(
                metadata,
                resource_type,
                ec2_arn(metadata, resource_type, id),
            ))
        })
        .collect();

    Classification::Changes(changes)
}

fn volume_attachment(detail: &Value, metadata: &AuditEventMetadata) -> Classification {
    let pointer = "/requestParameters/volumeId";
    let Some(volume_id) = text(detail, pointer) else {
        return Classification::missing(pointer);
    };

    let mut changes = vec![ResourceChange::resource(
        metadata,
        ResourceType::Ec2Volume,
        ec2_arn(metadata, ResourceType::Ec2Volume, volume_id),
    )];

    // Detaching may omit the instance; the attachment is still visible on the volume.
    if let Some(instance_id) = text(detail, "/requestParameters/instanceId")
        .or_else(|| text(detail, "/responseElements/instanceId"))
    {
        changes.push(ResourceChange::resource(
            metadata,
            ResourceType::Ec2Instance,
            ec2_arn(metadata, ResourceType::Ec2Instance, instance_id),
        ));
    }

    Classification::Changes(changes)
}
