//! Cheap pre-classification checks on raw audit events.

use std::collections::HashSet;

use serde_json::Value;
use tripwire_core::{AccountId, AppError, AppResult};
use tripwire_domain::AuditEventMetadata;

use crate::classification::ClassifierRegistry;
use crate::ignore_list::{IGNORED_ACTIONS, IGNORED_PREFIXES};
use crate::outcome::DropReason;

/// Result of inspecting one raw audit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The event should be classified.
    Classifiable(AuditEventMetadata),
    /// The event is expected traffic that needs no action.
    Dropped(DropReason),
}

/// Extracts metadata and drops non-mutating or unsupported events before
/// full classification.
#[derive(Debug, Clone)]
pub struct EventFilter {
    ignored_actions: HashSet<&'static str>,
    ignored_prefixes: &'static [&'static str],
    supported_sources: HashSet<&'static str>,
}

impl EventFilter {
    /// Creates a filter accepting the services of the given registry.
    #[must_use]
    pub fn for_registry(registry: &ClassifierRegistry) -> Self {
        Self::new(registry.event_sources())
    }

    /// Creates a filter accepting the given service identifiers.
    #[must_use]
    pub fn new(supported_sources: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            ignored_actions: IGNORED_ACTIONS.iter().copied().collect(),
            ignored_prefixes: IGNORED_PREFIXES,
            supported_sources: supported_sources.into_iter().collect(),
        }
    }

    /// Returns whether an action name is on the ignore list or matches an
    /// ignored prefix.
    #[must_use]
    pub fn is_ignored(&self, event_name: &str) -> bool {
        self.ignored_actions.contains(event_name)
            || self
                .ignored_prefixes
                .iter()
                .any(|prefix| event_name.starts_with(prefix))
    }

    /// Extracts metadata from one raw audit event.
    ///
    /// Checks run in a fixed order so that an ignored action is dropped even
    /// when its service is unsupported or other fields are missing.
    pub fn extract(&self, event: &Value) -> AppResult<Extraction> {
        let Some(event_name) = field(event, "/eventName") else {
            return Err(AppError::Validation(
                "audit event is missing 'eventName'".to_owned(),
            ));
        };

        if self.is_ignored(event_name) {
            return Ok(Extraction::Dropped(DropReason::IgnoredAction));
        }
        if is_read_only(event) {
            return Ok(Extraction::Dropped(DropReason::ReadOnly));
        }
        if field(event, "/errorCode").is_some() {
            return Ok(Extraction::Dropped(DropReason::FailedCall));
        }

        let Some(event_source) = field(event, "/eventSource") else {
            return Err(AppError::Validation(format!(
                "audit event '{event_name}' is missing 'eventSource'"
            )));
        };

        if !self.supported_sources.contains(event_source) {
            return Ok(Extraction::Dropped(DropReason::UnsupportedService));
        }

        let Some(account_id) = field(event, "/recipientAccountId")
            .or_else(|| field(event, "/userIdentity/accountId"))
        else {
            return Err(AppError::Validation(format!(
                "audit event '{event_name}' from '{event_source}' is missing an account id"
            )));
        };
        let Some(region) = field(event, "/awsRegion") else {
            return Err(AppError::Validation(format!(
                "audit event '{event_name}' from '{event_source}' is missing 'awsRegion'"
            )));
        };

        let metadata =
            AuditEventMetadata::new(AccountId::new(account_id)?, region, event_source, event_name)?;
        Ok(Extraction::Classifiable(metadata))
    }
}

fn field<'a>(event: &'a Value, pointer: &str) -> Option<&'a str> {
    event
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn is_read_only(event: &Value) -> bool {
    match event.get("readOnly") {
        Some(Value::Bool(read_only)) => *read_only,
        Some(Value::String(read_only)) => read_only.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{EventFilter, Extraction};
    use crate::outcome::DropReason;

    fn filter() -> EventFilter {
        EventFilter::new(["s3.amazonaws.com", "iam.amazonaws.com"])
    }

    #[test]
    fn supported_event_yields_metadata() {
        let result = filter().extract(&json!({
            "eventName": "DeleteBucket",
            "eventSource": "s3.amazonaws.com",
            "awsRegion": "us-west-2",
            "userIdentity": {"accountId": "111111111111"}
        }));
        assert!(result.is_ok());

        let Extraction::Classifiable(metadata) = result.unwrap_or_else(|_| unreachable!()) else {
            panic!("expected classifiable event");
        };
        assert_eq!(metadata.account_id().as_str(), "111111111111");
        assert_eq!(metadata.region(), "us-west-2");
        assert_eq!(metadata.event_name(), "DeleteBucket");
    }

    #[test]
    fn recipient_account_is_preferred_over_caller_account() {
        let result = filter().extract(&json!({
            "eventName": "DeleteBucket",
            "eventSource": "s3.amazonaws.com",
            "awsRegion": "us-west-2",
            "recipientAccountId": "222222222222",
            "userIdentity": {"accountId": "111111111111"}
        }));

        assert!(matches!(
            result,
            Ok(Extraction::Classifiable(metadata)) if metadata.account_id().as_str() == "222222222222"
        ));
    }

    #[test]
    fn ignored_action_wins_over_missing_fields_and_unknown_service() {
        for event_name in ["ListBuckets", "DescribeInstances", "AssumeRoleWithSAML", "Decrypt"] {
            let result = filter().extract(&json!({
                "eventName": event_name,
                "eventSource": "unknown.amazonaws.com"
            }));
            assert_eq!(
                result.ok(),
                Some(Extraction::Dropped(DropReason::IgnoredAction)),
                "{event_name}"
            );
        }
    }

    #[test]
    fn missing_event_name_is_an_error() {
        let result = filter().extract(&json!({"eventSource": "s3.amazonaws.com"}));
        assert!(result.is_err());
    }

    #[test]
    fn read_only_and_failed_calls_are_dropped() {
        let read_only = filter().extract(&json!({
            "eventName": "PutBucketPolicy",
            "readOnly": true
        }));
        let failed = filter().extract(&json!({
            "eventName": "PutBucketPolicy",
            "errorCode": "AccessDenied"
        }));

        assert_eq!(read_only.ok(), Some(Extraction::Dropped(DropReason::ReadOnly)));
        assert_eq!(failed.ok(), Some(Extraction::Dropped(DropReason::FailedCall)));
    }

    #[test]
    fn unsupported_service_is_dropped_before_account_checks() {
        let result = filter().extract(&json!({
            "eventName": "CreateQueue",
            "eventSource": "sqs.amazonaws.com"
        }));

        assert_eq!(
            result.ok(),
            Some(Extraction::Dropped(DropReason::UnsupportedService))
        );
    }

    #[test]
    fn supported_service_without_region_is_an_error() {
        let result = filter().extract(&json!({
            "eventName": "CreateUser",
            "eventSource": "iam.amazonaws.com",
            "recipientAccountId": "111111111111"
        }));

        assert!(result.is_err());
    }
}
