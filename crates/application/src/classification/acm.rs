use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn, is_arn, text};
use super::{Classification, ClassificationRule};

pub(super) struct AcmRule;

impl ClassificationRule for AcmRule {
    fn event_source(&self) -> &'static str {
        "acm.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let pointer = match metadata.event_name() {
            "ImportCertificate" | "RequestCertificate" => {
                // Re-importing into an existing certificate names it in the request.
                if text(detail, "/requestParameters/certificateArn").is_some() {
                    "/requestParameters/certificateArn"
                } else {
                    "/responseElements/certificateArn"
                }
            }
            "AddTagsToCertificate"
            | "DeleteCertificate"
            | "RemoveTagsFromCertificate"
            | "RenewCertificate"
            | "UpdateCertificateOptions" => "/requestParameters/certificateArn",
            _ => return Classification::Unmapped,
        };

        let Some(certificate) = text(detail, pointer) else {
            return Classification::missing(pointer);
        };

        let certificate_arn = if is_arn(certificate) {
            certificate.to_owned()
        } else {
            arn(metadata, "acm", format!("certificate/{certificate}").as_str())
        };

        Classification::single(
            ResourceChange::resource(metadata, ResourceType::AcmCertificate, certificate_arn)
                .deleted_if(metadata.event_name() == "DeleteCertificate"),
        )
    }
}
