//! Actions that never change resource state.
//!
//! This is maintained data: entries are added as providers ship new
//! non-mutating APIs.

/// Name prefixes of read-only and credential-issuing action families.
pub(crate) const IGNORED_PREFIXES: &[&str] = &["AssumeRole", "Describe", "Get", "List"];

/// Exact action names that are read-only, data-plane, or session-level.
pub(crate) const IGNORED_ACTIONS: &[&str] = &[
    "AbortMultipartUpload",
    "BatchCheckLayerAvailability",
    "BatchGetImage",
    "BatchGetItem",
    "BatchWriteItem",
    "CheckMfa",
    "CompleteMultipartUpload",
    "ConsoleLogin",
    "CopyObject",
    "CreateLogStream",
    "CreateMultipartUpload",
    "CreateServiceLinkedChannel",
    "DecodeAuthorizationMessage",
    "Decrypt",
    "DeleteItem",
    "DeleteObject",
    "DeleteObjects",
    "DownloadDBLogFilePortion",
    "Encrypt",
    "ExitRole",
    "FilterLogEvents",
    "GenerateCredentialReport",
    "GenerateDataKey",
    "GenerateDataKeyPair",
    "GenerateDataKeyPairWithoutPlaintext",
    "GenerateDataKeyWithoutPlaintext",
    "GenerateMac",
    "GenerateRandom",
    "GenerateServiceLastAccessedDetails",
    "HeadBucket",
    "HeadObject",
    "InitiateLayerUpload",
    "Invoke",
    "LookupEvents",
    "PutEvaluations",
    "PutImage",
    "PutItem",
    "PutLogEvents",
    "PutMetricData",
    "PutObject",
    "Query",
    "ReEncrypt",
    "RenewRole",
    "RestoreObject",
    "Scan",
    "SelectObjectContent",
    "SendCommand",
    "Sign",
    "SimulateCustomPolicy",
    "SimulatePrincipalPolicy",
    "StartQuery",
    "SwitchRole",
    "TestEventPattern",
    "UpdateInstanceInformation",
    "UpdateItem",
    "UploadLayerPart",
    "UploadPart",
    "UploadPartCopy",
    "ValidateTemplate",
    "Verify",
    "VerifyMac",
];
