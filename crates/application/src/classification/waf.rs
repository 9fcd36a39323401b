use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn, arn_resource, global_arn, is_arn, text};
use super::{Classification, ClassificationRule};

/// Classic WAF, either the global (CloudFront) flavor or the regional one.
pub(super) struct WafRule {
    event_source: &'static str,
    regional: bool,
}

impl WafRule {
    pub(super) fn global() -> Self {
        Self {
            event_source: "waf.amazonaws.com",
            regional: false,
        }
    }

    pub(super) fn regional() -> Self {
        Self {
            event_source: "waf-regional.amazonaws.com",
            regional: true,
        }
    }

    fn resource_type(&self) -> ResourceType {
        if self.regional {
            ResourceType::WafRegionalWebAcl
        } else {
            ResourceType::WafWebAcl
        }
    }

    fn web_acl(&self, metadata: &AuditEventMetadata, web_acl: &str) -> ResourceChange {
        let change = if is_arn(web_acl) {
            ResourceChange::resource(metadata, self.resource_type(), web_acl)
        } else if self.regional {
            ResourceChange::resource(
                metadata,
                self.resource_type(),
                arn(metadata, "waf-regional", format!("webacl/{web_acl}").as_str()),
            )
        } else {
            ResourceChange::resource(
                metadata,
                self.resource_type(),
                global_arn(metadata, "waf", format!("webacl/{web_acl}").as_str()),
            )
        };

        if self.regional { change } else { change.in_region("") }
    }

    /// Association changes both the web ACL and the protected load balancer.
    fn association(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let pointer = "/requestParameters/resourceArn";
        let Some(resource_arn) = text(detail, pointer) else {
            return Classification::missing(pointer);
        };

        let mut changes = vec![match text(detail, "/requestParameters/webACLId") {
            Some(web_acl) => self.web_acl(metadata, web_acl),
            // Disassociation names only the protected resource.
            None => self.every_web_acl(metadata),
        }];

        let is_application_load_balancer = arn_resource(resource_arn)
            .is_some_and(|resource| resource.starts_with("loadbalancer/app/"));
        if is_application_load_balancer {
            changes.push(ResourceChange::resource(
                metadata,
                ResourceType::Elbv2ApplicationLoadBalancer,
                resource_arn,
            ));
        }

        Classification::Changes(changes)
    }

    /// Rules and rule groups are taggable too; their tags do not reach a web ACL.
    fn tagged_resource(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let pointer = "/requestParameters/resourceARN";
        let Some(resource_arn) = text(detail, pointer) else {
            return Classification::missing(pointer);
        };

        match arn_resource(resource_arn) {
            Some(resource) if resource.starts_with("webacl/") => {
                Classification::single(self.web_acl(metadata, resource_arn))
            }
            Some(_) => Classification::Changes(Vec::new()),
            None => Classification::Malformed(format!(
                "resource '{resource_arn}' is not a WAF ARN"
            )),
        }
    }

    /// Shared rules and match sets may feed any web ACL.
    fn every_web_acl(&self, metadata: &AuditEventMetadata) -> ResourceChange {
        if self.regional {
            ResourceChange::region_scan(metadata, self.resource_type())
        } else {
            ResourceChange::account_scan(metadata, self.resource_type())
        }
    }
}

impl ClassificationRule for WafRule {
    fn event_source(&self) -> &'static str {
        self.event_source
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();
        let pointer = match event_name {
            "CreateWebACL" => "/responseElements/webACL/webACLId",
            "DeleteWebACL" | "UpdateWebACL" => "/requestParameters/webACLId",
            "PutLoggingConfiguration" => "/requestParameters/loggingConfiguration/resourceArn",
            "DeleteLoggingConfiguration" => "/requestParameters/resourceArn",
            "TagResource" | "UntagResource" => return self.tagged_resource(detail, metadata),
            "AssociateWebACL" | "DisassociateWebACL" if self.regional => {
                return self.association(detail, metadata);
            }
            "CreateRateBasedRule"
            | "CreateRule"
            | "CreateRuleGroup"
            | "DeleteRateBasedRule"
            | "DeleteRule"
            | "DeleteRuleGroup"
            | "UpdateByteMatchSet"
            | "UpdateGeoMatchSet"
            | "UpdateIPSet"
            | "UpdateRateBasedRule"
            | "UpdateRegexMatchSet"
            | "UpdateRule"
            | "UpdateRuleGroup"
            | "UpdateSizeConstraintSet"
            | "UpdateSqlInjectionMatchSet"
            | "UpdateXssMatchSet" => return Classification::single(self.every_web_acl(metadata)),
            _ => return Classification::Unmapped,
        };

        let Some(web_acl) = text(detail, pointer) else {
            return Classification::missing(pointer);
        };

        Classification::single(
            self.web_acl(metadata, web_acl)
                .deleted_if(event_name == "DeleteWebACL"),
        )
    }
}
