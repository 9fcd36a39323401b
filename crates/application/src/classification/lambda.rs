use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn_in_region, arn_region, arn_resource, is_arn, text, unversioned_action};
use super::{Classification, ClassificationRule};

pub(super) struct LambdaRule;

impl ClassificationRule for LambdaRule {
    fn event_source(&self) -> &'static str {
        "lambda.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        // Lambda appends the API version to every event name.
        let metadata = metadata.with_event_name(unversioned_action(metadata.event_name()));
        let metadata = &metadata;
        let event_name = metadata.event_name();

        let pointer = match event_name {
            "CreateFunction" => {
                if text(detail, "/responseElements/functionArn").is_some() {
                    "/responseElements/functionArn"
                } else {
                    "/requestParameters/functionName"
                }
            }
            "AddPermission"
            | "CreateAlias"
            | "CreateEventSourceMapping"
            | "DeleteAlias"
            | "DeleteFunction"
            | "DeleteFunctionConcurrency"
            | "DeleteFunctionEventInvokeConfig"
            | "DeleteProvisionedConcurrencyConfig"
            | "PublishVersion"
            | "PutFunctionConcurrency"
            | "PutFunctionEventInvokeConfig"
            | "PutProvisionedConcurrencyConfig"
            | "RemovePermission"
            | "UpdateAlias"
            | "UpdateFunctionCode"
            | "UpdateFunctionConfiguration"
            | "UpdateFunctionEventInvokeConfig" => "/requestParameters/functionName",
            "TagResource" | "UntagResource" => "/requestParameters/resource",
            // Mappings are addressed by uuid; the function is not named.
            "DeleteEventSourceMapping" | "UpdateEventSourceMapping" => {
                return Classification::single(ResourceChange::region_scan(
                    metadata,
                    ResourceType::LambdaFunction,
                ));
            }
            _ => return Classification::Unmapped,
        };

        let Some(function) = text(detail, pointer) else {
            return Classification::missing(pointer);
        };
        let Some(FunctionReference { name, qualified }) = function_reference(function) else {
            return Classification::Malformed(format!("'{function}' does not name a function"));
        };

        let region = arn_region(function).unwrap_or(metadata.region());
        // Deleting a single version leaves the function in place. The version
        // may be passed separately or appended to the function name.
        let delete = event_name == "DeleteFunction"
            && !qualified
            && text(detail, "/requestParameters/qualifier").is_none();

        Classification::single(
            ResourceChange::resource(
                metadata,
                ResourceType::LambdaFunction,
                arn_in_region(metadata, "lambda", region, format!("function:{name}").as_str()),
            )
            .in_region(region)
            .deleted_if(delete),
        )
    }
}

#[derive(Debug, PartialEq, Eq)]
struct FunctionReference<'a> {
    name: &'a str,
    /// A version or alias followed the name.
    qualified: bool,
}

/// Accepts a bare name, `name:qualifier`, a partial ARN
/// (`123456789012:function:name`) or a full ARN with optional qualifier.
fn function_reference(value: &str) -> Option<FunctionReference<'_>> {
    let (name, qualifier) = if is_arn(value) {
        let mut parts = arn_resource(value)?.strip_prefix("function:")?.split(':');
        (parts.next()?, parts.next())
    } else {
        let parts: Vec<&str> = value.split(':').collect();
        match parts.as_slice() {
            [_, "function", name, rest @ ..] | [name, rest @ ..] => {
                (*name, rest.first().copied())
            }
            [] => return None,
        }
    };

    (!name.is_empty()).then_some(FunctionReference {
        name,
        qualified: qualifier.is_some_and(|qualifier| !qualifier.is_empty()),
    })
}
