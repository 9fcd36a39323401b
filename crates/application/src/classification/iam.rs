use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{global_arn, is_arn, meta_resource_id, text};
use super::{Classification, ClassificationRule};

const USER_NAME: &str = "/requestParameters/userName";
const GROUP_NAME: &str = "/requestParameters/groupName";
const ROLE_NAME: &str = "/requestParameters/roleName";
const POLICY_ARN: &str = "/requestParameters/policyArn";

/// IAM is global: every change it produces is account-wide in region terms.
pub(super) struct IamRule;

impl ClassificationRule for IamRule {
    fn event_source(&self) -> &'static str {
        "iam.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        match iam_changes(detail, metadata) {
            Ok(changes) => Classification::Changes(changes),
            Err(outcome) => outcome,
        }
    }
}

fn iam_changes(
    detail: &Value,
    metadata: &AuditEventMetadata,
) -> Result<Vec<ResourceChange>, Classification> {
    use ResourceType::{IamGroup, IamPolicy, IamRole, IamUser};

    let changes = match metadata.event_name() {
        "CreateUser" => vec![created(
            detail,
            metadata,
            IamUser,
            "/responseElements/user/arn",
            USER_NAME,
        )?],
        "DeleteUser" => vec![named(detail, metadata, IamUser, USER_NAME)?.deleted()],
        "AttachUserPolicy" | "DetachUserPolicy" => vec![
            named(detail, metadata, IamUser, USER_NAME)?,
            named(detail, metadata, IamPolicy, POLICY_ARN)?,
        ],
        "DeleteUserPermissionsBoundary"
        | "DeleteUserPolicy"
        | "PutUserPermissionsBoundary"
        | "PutUserPolicy"
        | "TagUser"
        | "UntagUser" => vec![named(detail, metadata, IamUser, USER_NAME)?],
        // Credential calls default to the caller when no user is named.
        "ChangePassword"
        | "CreateAccessKey"
        | "CreateLoginProfile"
        | "CreateServiceSpecificCredential"
        | "DeactivateMFADevice"
        | "DeleteAccessKey"
        | "DeleteLoginProfile"
        | "DeleteServiceSpecificCredential"
        | "DeleteSigningCertificate"
        | "DeleteSSHPublicKey"
        | "EnableMFADevice"
        | "ResyncMFADevice"
        | "UpdateAccessKey"
        | "UpdateLoginProfile"
        | "UpdateSigningCertificate"
        | "UpdateSSHPublicKey"
        | "UploadSigningCertificate"
        | "UploadSSHPublicKey" => vec![user_or_caller(detail, metadata)?],
        "AddUserToGroup" | "RemoveUserFromGroup" => vec![
            named(detail, metadata, IamUser, USER_NAME)?,
            named(detail, metadata, IamGroup, GROUP_NAME)?,
        ],
        "UpdateUser" => renamed(
            detail,
            metadata,
            IamUser,
            USER_NAME,
            "/requestParameters/newUserName",
        )?,

        "CreateGroup" => vec![created(
            detail,
            metadata,
            IamGroup,
            "/responseElements/group/arn",
            GROUP_NAME,
        )?],
        "DeleteGroup" => vec![named(detail, metadata, IamGroup, GROUP_NAME)?.deleted()],
        "AttachGroupPolicy" | "DetachGroupPolicy" => vec![
            named(detail, metadata, IamGroup, GROUP_NAME)?,
            named(detail, metadata, IamPolicy, POLICY_ARN)?,
        ],
        "DeleteGroupPolicy" | "PutGroupPolicy" => {
            vec![named(detail, metadata, IamGroup, GROUP_NAME)?]
        }
        "UpdateGroup" => renamed(
            detail,
            metadata,
            IamGroup,
            GROUP_NAME,
            "/requestParameters/newGroupName",
        )?,

        "CreateRole" => vec![created(
            detail,
            metadata,
            IamRole,
            "/responseElements/role/arn",
            ROLE_NAME,
        )?],
        "CreateServiceLinkedRole" => vec![created(
            detail,
            metadata,
            IamRole,
            "/responseElements/role/arn",
            "/responseElements/role/roleName",
        )?],
        "DeleteRole" | "DeleteServiceLinkedRole" => {
            vec![named(detail, metadata, IamRole, ROLE_NAME)?.deleted()]
        }
        "AttachRolePolicy" | "DetachRolePolicy" => vec![
            named(detail, metadata, IamRole, ROLE_NAME)?,
            named(detail, metadata, IamPolicy, POLICY_ARN)?,
        ],
        "AddRoleToInstanceProfile"
        | "DeleteRolePermissionsBoundary"
        | "DeleteRolePolicy"
        | "PutRolePermissionsBoundary"
        | "PutRolePolicy"
        | "RemoveRoleFromInstanceProfile"
        | "TagRole"
        | "UntagRole"
        | "UpdateAssumeRolePolicy"
        | "UpdateRole"
        | "UpdateRoleDescription" => vec![named(detail, metadata, IamRole, ROLE_NAME)?],

        "CreatePolicy" => vec![created(
            detail,
            metadata,
            IamPolicy,
            "/responseElements/policy/arn",
            POLICY_ARN,
        )?],
        "DeletePolicy" => vec![named(detail, metadata, IamPolicy, POLICY_ARN)?.deleted()],
        "CreatePolicyVersion"
        | "DeletePolicyVersion"
        | "SetDefaultPolicyVersion"
        | "TagPolicy"
        | "UntagPolicy" => vec![named(detail, metadata, IamPolicy, POLICY_ARN)?],

        "DeleteAccountPasswordPolicy" | "UpdateAccountPasswordPolicy" => vec![
            global(
                metadata,
                ResourceType::PasswordPolicy,
                meta_resource_id(metadata, ResourceType::PasswordPolicy),
            )
            .deleted_if(metadata.event_name() == "DeleteAccountPasswordPolicy"),
        ],
        _ => return Err(Classification::Unmapped),
    };

    Ok(changes)
}

fn global(
    metadata: &AuditEventMetadata,
    resource_type: ResourceType,
    resource_id: impl Into<String>,
) -> ResourceChange {
    ResourceChange::resource(metadata, resource_type, resource_id).in_region("")
}

fn iam_arn(metadata: &AuditEventMetadata, resource_type: ResourceType, name: &str) -> String {
    if is_arn(name) {
        return name.to_owned();
    }

    let kind = match resource_type {
        ResourceType::IamGroup => "group",
        ResourceType::IamRole => "role",
        ResourceType::IamPolicy => "policy",
        _ => "user",
    };
    global_arn(metadata, "iam", format!("{kind}/{name}").as_str())
}

fn named(
    detail: &Value,
    metadata: &AuditEventMetadata,
    resource_type: ResourceType,
    pointer: &str,
) -> Result<ResourceChange, Classification> {
    let name = text(detail, pointer).ok_or_else(|| Classification::missing(pointer))?;
    Ok(global(metadata, resource_type, iam_arn(metadata, resource_type, name)))
}

/// Prefers the full ARN from the response, which includes any path.
fn created(
    detail: &Value,
    metadata: &AuditEventMetadata,
    resource_type: ResourceType,
    arn_pointer: &str,
    name_pointer: &str,
) -> Result<ResourceChange, Classification> {
    match text(detail, arn_pointer) {
        Some(resource_arn) => Ok(global(metadata, resource_type, resource_arn)),
        None => named(detail, metadata, resource_type, name_pointer),
    }
}

fn user_or_caller(
    detail: &Value,
    metadata: &AuditEventMetadata,
) -> Result<ResourceChange, Classification> {
    if text(detail, USER_NAME).is_some() {
        return named(detail, metadata, ResourceType::IamUser, USER_NAME);
    }

    match text(detail, "/userIdentity/type") {
        Some("Root") => Ok(global(
            metadata,
            ResourceType::IamRootUser,
            meta_resource_id(metadata, ResourceType::IamRootUser),
        )),
        Some("IAMUser") => {
            let pointer = "/userIdentity/arn";
            let caller_arn =
                text(detail, pointer).ok_or_else(|| Classification::missing(pointer))?;
            Ok(global(metadata, ResourceType::IamUser, caller_arn))
        }
        other => Err(Classification::Malformed(format!(
            "no user named and caller type {other:?} is not a user"
        ))),
    }
}

/// A rename removes the old identity and creates the new one.
fn renamed(
    detail: &Value,
    metadata: &AuditEventMetadata,
    resource_type: ResourceType,
    old_pointer: &str,
    new_pointer: &str,
) -> Result<Vec<ResourceChange>, Classification> {
    let old = named(detail, metadata, resource_type, old_pointer)?;
    match text(detail, new_pointer) {
        Some(new_name) => Ok(vec![
            old.deleted(),
            global(metadata, resource_type, iam_arn(metadata, resource_type, new_name)),
        ]),
        // Path-only updates keep the name.
        None => Ok(vec![old]),
    }
}
