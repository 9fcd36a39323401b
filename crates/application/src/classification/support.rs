//! Field access and identifier construction shared by the service rules.

use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceType};

/// Returns the trimmed, non-empty string at a JSON pointer.
pub(super) fn text<'a>(detail: &'a Value, pointer: &str) -> Option<&'a str> {
    detail
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Returns every non-empty string in the array at a JSON pointer.
pub(super) fn text_list<'a>(detail: &'a Value, pointer: &str) -> Vec<&'a str> {
    detail
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Returns `field` of every object in the array at a JSON pointer.
pub(super) fn field_list<'a>(detail: &'a Value, pointer: &str, field: &str) -> Vec<&'a str> {
    detail
        .pointer(pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(field))
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Returns the ARN partition a region belongs to.
pub(super) fn partition(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else {
        "aws"
    }
}

/// Builds a regional ARN in the event's account and region.
pub(super) fn arn(metadata: &AuditEventMetadata, service: &str, resource: &str) -> String {
    arn_in_region(metadata, service, metadata.region(), resource)
}

/// Builds a regional ARN in the event's account and the given region.
pub(super) fn arn_in_region(
    metadata: &AuditEventMetadata,
    service: &str,
    region: &str,
    resource: &str,
) -> String {
    format!(
        "arn:{}:{service}:{region}:{}:{resource}",
        partition(region),
        metadata.account_id()
    )
}

/// Builds an ARN for a global service that still records the account.
pub(super) fn global_arn(metadata: &AuditEventMetadata, service: &str, resource: &str) -> String {
    format!(
        "arn:{}:{service}::{}:{resource}",
        partition(metadata.region()),
        metadata.account_id()
    )
}

/// Returns whether the value is already a fully qualified ARN.
pub(super) fn is_arn(value: &str) -> bool {
    value.starts_with("arn:")
}

/// Returns the resource part of an ARN (everything after the account field).
pub(super) fn arn_resource(value: &str) -> Option<&str> {
    let mut parts = value.splitn(6, ':');
    if parts.next() != Some("arn") {
        return None;
    }

    parts.nth(4).filter(|resource| !resource.is_empty())
}

/// Returns the region field of an ARN, if it has one.
pub(super) fn arn_region(value: &str) -> Option<&str> {
    let mut parts = value.splitn(6, ':');
    if parts.next() != Some("arn") {
        return None;
    }

    parts.nth(2).filter(|region| !region.is_empty())
}

/// Identifier of an account-level summary resource, e.g. `123456789012::AWS.CloudTrail.Meta`.
pub(super) fn meta_resource_id(
    metadata: &AuditEventMetadata,
    resource_type: ResourceType,
) -> String {
    format!("{}::{}", metadata.account_id(), resource_type)
}

/// Identifier of a resource that exists at most once per account and region.
pub(super) fn regional_singleton_id(
    metadata: &AuditEventMetadata,
    resource_type: ResourceType,
) -> String {
    format!(
        "{}:{}:{}",
        metadata.account_id(),
        metadata.region(),
        resource_type
    )
}

/// Strips a trailing API version such as `20150331` or `20150331v2`.
pub(super) fn unversioned_action(event_name: &str) -> &str {
    let without_revision = match event_name.rfind('v') {
        Some(index)
            if index + 1 < event_name.len()
                && event_name[index + 1..].bytes().all(|byte| byte.is_ascii_digit()) =>
        {
            &event_name[..index]
        }
        _ => event_name,
    };

    let digits = without_revision
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 8 && digits < without_revision.len() {
        &without_revision[..without_revision.len() - digits]
    } else {
        event_name
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{arn_region, arn_resource, field_list, partition, text, unversioned_action};

    #[test]
    fn text_skips_blank_values() {
        let detail = json!({"requestParameters": {"name": "  ", "other": "value"}});
        assert_eq!(text(&detail, "/requestParameters/name"), None);
        assert_eq!(text(&detail, "/requestParameters/other"), Some("value"));
        assert_eq!(text(&detail, "/requestParameters/missing"), None);
    }

    #[test]
    fn field_list_collects_nested_ids() {
        let detail = json!({"items": [{"id": "a"}, {"id": ""}, {"other": "x"}, {"id": "b"}]});
        assert_eq!(field_list(&detail, "/items", "id"), vec!["a", "b"]);
    }

    #[test]
    fn partition_follows_region_prefix() {
        assert_eq!(partition("cn-north-1"), "aws-cn");
        assert_eq!(partition("us-gov-west-1"), "aws-us-gov");
        assert_eq!(partition("eu-central-1"), "aws");
    }

    #[test]
    fn arn_parts_are_split_on_first_five_colons() {
        let value = "arn:aws:logs:us-east-1:111111111111:log-group:/aws/lambda/x:*";
        assert_eq!(arn_resource(value), Some("log-group:/aws/lambda/x:*"));
        assert_eq!(arn_region(value), Some("us-east-1"));
        assert_eq!(arn_region("arn:aws:iam::111111111111:role/x"), None);
        assert_eq!(arn_resource("not-an-arn"), None);
    }

    #[test]
    fn api_version_suffixes_are_removed() {
        assert_eq!(unversioned_action("CreateFunction20150331"), "CreateFunction");
        assert_eq!(
            unversioned_action("UpdateFunctionConfiguration20150331v2"),
            "UpdateFunctionConfiguration"
        );
        assert_eq!(unversioned_action("TagResource"), "TagResource");
        assert_eq!(unversioned_action("Version2"), "Version2");
    }
}
