use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn, arn_resource, is_arn, text};
use super::{Classification, ClassificationRule};

/// Keys are never reported deleted: a scheduled deletion leaves the key in
/// place, pending, until the waiting period ends.
pub(super) struct KmsRule;

impl ClassificationRule for KmsRule {
    fn event_source(&self) -> &'static str {
        "kms.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let pointer = match metadata.event_name() {
            "CreateKey" => {
                if text(detail, "/responseElements/keyMetadata/arn").is_some() {
                    "/responseElements/keyMetadata/arn"
                } else {
                    "/responseElements/keyMetadata/keyId"
                }
            }
            "CancelKeyDeletion"
            | "CreateGrant"
            | "DeleteImportedKeyMaterial"
            | "DisableKey"
            | "DisableKeyRotation"
            | "EnableKey"
            | "EnableKeyRotation"
            | "ImportKeyMaterial"
            | "PutKeyPolicy"
            | "ReplicateKey"
            | "RevokeGrant"
            | "ScheduleKeyDeletion"
            | "TagResource"
            | "UntagResource"
            | "UpdateKeyDescription" => "/requestParameters/keyId",
            "CreateAlias" | "UpdateAlias" => "/requestParameters/targetKeyId",
            // Only the alias or grant token is named.
            "DeleteAlias" | "RetireGrant" => {
                return Classification::single(ResourceChange::region_scan(
                    metadata,
                    ResourceType::KmsKey,
                ));
            }
            _ => return Classification::Unmapped,
        };

        let Some(key) = text(detail, pointer) else {
            return Classification::missing(pointer);
        };

        Classification::single(match key_arn(metadata, key) {
            Some(key_arn) => ResourceChange::resource(metadata, ResourceType::KmsKey, key_arn),
            None => ResourceChange::region_scan(metadata, ResourceType::KmsKey),
        })
    }
}

/// Resolves a key id or key ARN; aliases cannot be resolved from the event.
fn key_arn(metadata: &AuditEventMetadata, key: &str) -> Option<String> {
    if is_arn(key) {
        return arn_resource(key)
            .filter(|resource| resource.starts_with("key/"))
            .map(|_| key.to_owned());
    }

    if key.starts_with("alias/") {
        return None;
    }

    Some(arn(metadata, "kms", format!("key/{key}").as_str()))
}
