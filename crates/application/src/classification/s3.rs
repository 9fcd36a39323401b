use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{partition, text};
use super::{Classification, ClassificationRule};

const BUCKET_ACTIONS: &[&str] = &[
    "CreateBucket",
    "DeleteBucket",
    "DeleteBucketCors",
    "DeleteBucketEncryption",
    "DeleteBucketLifecycle",
    "DeleteBucketPolicy",
    "DeleteBucketPublicAccessBlock",
    "DeleteBucketReplication",
    "DeleteBucketTagging",
    "DeleteBucketWebsite",
    "PutBucketAcl",
    "PutBucketCors",
    "PutBucketEncryption",
    "PutBucketLifecycle",
    "PutBucketLifecycleConfiguration",
    "PutBucketLogging",
    "PutBucketNotification",
    "PutBucketObjectLockConfiguration",
    "PutBucketOwnershipControls",
    "PutBucketPolicy",
    "PutBucketPublicAccessBlock",
    "PutBucketReplication",
    "PutBucketRequestPayment",
    "PutBucketTagging",
    "PutBucketVersioning",
    "PutBucketWebsite",
];

pub(super) struct S3Rule;

impl ClassificationRule for S3Rule {
    fn event_source(&self) -> &'static str {
        "s3.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        let event_name = metadata.event_name();

        // Account-level block settings apply to every bucket.
        if matches!(
            event_name,
            "PutAccountPublicAccessBlock" | "DeleteAccountPublicAccessBlock"
        ) {
            return Classification::single(ResourceChange::account_scan(
                metadata,
                ResourceType::S3Bucket,
            ));
        }

        if !BUCKET_ACTIONS.contains(&event_name) {
            return Classification::Unmapped;
        }

        let pointer = "/requestParameters/bucketName";
        let Some(bucket_name) = text(detail, pointer) else {
            return Classification::missing(pointer);
        };

        let bucket_arn = format!("arn:{}:s3:::{bucket_name}", partition(metadata.region()));
        Classification::single(
            ResourceChange::resource(metadata, ResourceType::S3Bucket, bucket_arn)
                .deleted_if(event_name == "DeleteBucket"),
        )
    }
}
