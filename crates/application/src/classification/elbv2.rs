use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn_resource, field_list, text, text_list};
use super::{Classification, ClassificationRule};

/// Classic and v2 load balancers share one event source; only application
/// load balancers are tracked.
pub(super) struct Elbv2Rule;

impl ClassificationRule for Elbv2Rule {
    fn event_source(&self) -> &'static str {
        "elasticloadbalancing.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        let arns = match event_name {
            "CreateLoadBalancer" => field_list(
                detail,
                "/responseElements/loadBalancers",
                "loadBalancerArn",
            ),
            "CreateListener"
            | "DeleteLoadBalancer"
            | "ModifyLoadBalancerAttributes"
            | "SetIpAddressType"
            | "SetSecurityGroups"
            | "SetSubnets" => single_arn(detail, "/requestParameters/loadBalancerArn"),
            "AddListenerCertificates"
            | "CreateRule"
            | "DeleteListener"
            | "ModifyListener"
            | "RemoveListenerCertificates" => single_arn(detail, "/requestParameters/listenerArn"),
            "DeleteRule" | "ModifyRule" => single_arn(detail, "/requestParameters/ruleArn"),
            "SetRulePriorities" => {
                field_list(detail, "/requestParameters/rulePriorities", "ruleArn")
            }
            "AddTags" | "RemoveTags" => text_list(detail, "/requestParameters/resourceArns"),
            _ => return Classification::Unmapped,
        };

        // Classic load balancers are addressed by name and produce no ARNs here.
        let mut changes: Vec<ResourceChange> = Vec::new();
        for arn in arns {
            let Some(load_balancer_arn) = application_load_balancer_arn(arn) else {
                continue;
            };
            if changes
                .iter()
                .any(|change| change.resource_id() == load_balancer_arn)
            {
                continue;
            }
            changes.push(
                ResourceChange::resource(
                    metadata,
                    ResourceType::Elbv2ApplicationLoadBalancer,
                    load_balancer_arn,
                )
                .deleted_if(event_name == "DeleteLoadBalancer"),
            );
        }

        Classification::Changes(changes)
    }
}

fn single_arn<'a>(detail: &'a Value, pointer: &str) -> Vec<&'a str> {
    text(detail, pointer).into_iter().collect()
}

/// Reduces a load balancer, listener or listener rule ARN to the owning
/// application load balancer ARN.
fn application_load_balancer_arn(value: &str) -> Option<String> {
    let resource = arn_resource(value)?;
    let prefix = &value[..value.len() - resource.len()];

    let mut segments = resource.split('/');
    let kind = segments.next()?;
    if !matches!(kind, "loadbalancer" | "listener" | "listener-rule") {
        return None;
    }
    if segments.next()? != "app" {
        return None;
    }
    let name = segments.next().filter(|name| !name.is_empty())?;
    let id = segments.next().filter(|id| !id.is_empty())?;

    Some(format!("{prefix}loadbalancer/app/{name}/{id}"))
}
