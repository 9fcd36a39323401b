//! Per-service rules that turn one audit event into resource changes.
//!
//! Every rule is a pure function of the raw event and its metadata. Rules
//! prefer identifiers named by the provider's API reference, build fully
//! qualified ARNs from short names, fan out over every affected region or
//! child resource, and fall back to a region- or account-wide scan when the
//! payload cannot name the target.

use std::collections::HashMap;

use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange};

mod acm;
mod cloudformation;
mod cloudtrail;
mod config;
mod dynamodb;
mod ec2;
mod ecs;
mod eks;
mod elbv2;
mod guardduty;
mod iam;
mod kms;
mod lambda;
mod logs;
mod rds;
mod redshift;
mod s3;
mod support;
mod waf;

/// Outcome of classifying one audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Resources the event touched. May be empty when nothing needs a rescan.
    Changes(Vec<ResourceChange>),
    /// The service is supported but this action has no mapping.
    Unmapped,
    /// The event names the action but its identifier could not be read.
    Malformed(String),
}

impl Classification {
    /// Wraps a single change.
    #[must_use]
    pub fn single(change: ResourceChange) -> Self {
        Self::Changes(vec![change])
    }

    /// Reports a required field that is absent or empty.
    #[must_use]
    pub fn missing(pointer: &str) -> Self {
        Self::Malformed(format!("missing or empty field '{pointer}'"))
    }
}

/// Classification behavior for one cloud service.
pub trait ClassificationRule: Send + Sync {
    /// Returns the service identifier this rule handles, e.g. `s3.amazonaws.com`.
    fn event_source(&self) -> &'static str;

    /// Maps one audit event to the resources it changed.
    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification;
}

/// Registry of classification rules keyed by service identifier.
pub struct ClassifierRegistry {
    rules: HashMap<&'static str, Box<dyn ClassificationRule>>,
}

impl ClassifierRegistry {
    /// Creates a registry with no rules.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Creates a registry with every built-in AWS service rule.
    #[must_use]
    pub fn aws() -> Self {
        Self::empty()
            .register(acm::AcmRule)
            .register(cloudformation::CloudFormationRule)
            .register(cloudtrail::CloudTrailRule)
            .register(config::ConfigRule)
            .register(dynamodb::DynamoDbRule)
            .register(ec2::Ec2Rule)
            .register(ecs::EcsRule)
            .register(eks::EksRule)
            .register(elbv2::Elbv2Rule)
            .register(guardduty::GuardDutyRule)
            .register(iam::IamRule)
            .register(kms::KmsRule)
            .register(lambda::LambdaRule)
            .register(logs::LogsRule)
            .register(rds::RdsRule)
            .register(redshift::RedshiftRule)
            .register(s3::S3Rule)
            .register(waf::WafRule::global())
            .register(waf::WafRule::regional())
    }

    /// Adds or replaces the rule for its service.
    #[must_use]
    pub fn register(mut self, rule: impl ClassificationRule + 'static) -> Self {
        self.rules.insert(rule.event_source(), Box::new(rule));
        self
    }

    /// Returns every registered service identifier.
    pub fn event_sources(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.keys().copied()
    }

    /// Runs the rule for the event's service and stamps event time and
    /// integration onto every produced change.
    #[must_use]
    pub fn classify(
        &self,
        detail: &Value,
        metadata: &AuditEventMetadata,
        integration_id: &str,
    ) -> Classification {
        let Some(rule) = self.rules.get(metadata.event_source()) else {
            return Classification::Unmapped;
        };

        match rule.classify(detail, metadata) {
            Classification::Changes(mut changes) => {
                let event_time = detail
                    .get("eventTime")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                for change in &mut changes {
                    change.stamp(event_time, integration_id);
                }
                Classification::Changes(changes)
            }
            other => other,
        }
    }
}

impl Default for ClassifierRegistry {
    fn default() -> Self {
        Self::aws()
    }
}

#[cfg(test)]
mod tests;
