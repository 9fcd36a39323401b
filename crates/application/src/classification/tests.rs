use serde_json::{Value, json};
use tripwire_core::AccountId;
use tripwire_domain::{AuditEventMetadata, ChangeScope, ResourceChange, ResourceType};

use super::{Classification, ClassifierRegistry};

const ACCOUNT: &str = "123456789012";
const INTEGRATION: &str = "integration-1";
const EVENT_TIME: &str = "2026-03-01T10:15:00Z";

fn metadata_in(region: &str, event_source: &str, event_name: &str) -> AuditEventMetadata {
    let account_id = AccountId::new(ACCOUNT);
    assert!(account_id.is_ok());
    let metadata = AuditEventMetadata::new(
        account_id.unwrap_or_else(|_| unreachable!()),
        region,
        event_source,
        event_name,
    );
    assert!(metadata.is_ok());
    metadata.unwrap_or_else(|_| unreachable!())
}

fn classify_in(region: &str, event_source: &str, event_name: &str, detail: Value) -> Classification {
    let mut detail = detail;
    if let Some(object) = detail.as_object_mut() {
        object.insert("eventTime".to_owned(), json!(EVENT_TIME));
    }

    ClassifierRegistry::aws().classify(
        &detail,
        &metadata_in(region, event_source, event_name),
        INTEGRATION,
    )
}

fn changes(event_source: &str, event_name: &str, detail: Value) -> Vec<ResourceChange> {
    changes_in("us-east-1", event_source, event_name, detail)
}

fn changes_in(
    region: &str,
    event_source: &str,
    event_name: &str,
    detail: Value,
) -> Vec<ResourceChange> {
    match classify_in(region, event_source, event_name, detail) {
        Classification::Changes(changes) => changes,
        other => panic!("expected changes, got {other:?}"),
    }
}

fn ids(changes: &[ResourceChange]) -> Vec<&str> {
    changes.iter().map(ResourceChange::resource_id).collect()
}

#[test]
fn registry_covers_every_supported_service() {
    let registry = ClassifierRegistry::aws();
    let mut sources: Vec<&str> = registry.event_sources().collect();
    sources.sort_unstable();

    assert_eq!(sources.len(), 19);
    assert!(sources.contains(&"waf-regional.amazonaws.com"));
    assert!(sources.contains(&"elasticloadbalancing.amazonaws.com"));
    assert!(!sources.contains(&"sqs.amazonaws.com"));
}

#[test]
fn s3_delete_bucket_builds_global_arn_and_stamps_event() {
    let produced = changes(
        "s3.amazonaws.com",
        "DeleteBucket",
        json!({"requestParameters": {"bucketName": "audit-logs"}}),
    );

    assert_eq!(produced.len(), 1);
    let change = &produced[0];
    assert_eq!(change.resource_id(), "arn:aws:s3:::audit-logs");
    assert_eq!(change.resource_type(), ResourceType::S3Bucket);
    assert_eq!(change.region(), "us-east-1");
    assert!(change.is_delete());
    assert_eq!(change.event_time(), EVENT_TIME);
    assert_eq!(change.integration_id(), INTEGRATION);
    assert_eq!(change.event_name(), "DeleteBucket");
}

#[test]
fn account_public_access_block_scans_every_bucket() {
    let produced = changes(
        "s3.amazonaws.com",
        "PutAccountPublicAccessBlock",
        json!({"requestParameters": {}}),
    );

    assert_eq!(produced.len(), 1);
    assert_eq!(produced[0].scope(), ChangeScope::Account);
    assert_eq!(produced[0].resource_type(), ResourceType::S3Bucket);
}

#[test]
fn deleting_config_recorder_also_updates_account_summary() {
    let produced = changes(
        "config.amazonaws.com",
        "DeleteConfigurationRecorder",
        json!({"requestParameters": {"configurationRecorderName": "default"}}),
    );

    assert_eq!(
        ids(&produced),
        vec![
            "123456789012:us-east-1:AWS.Config.Recorder",
            "123456789012::AWS.Config.Recorder.Meta",
        ]
    );
    assert!(produced[0].is_delete());
    assert!(!produced[1].is_delete());
    assert_eq!(produced[1].region(), "");
}

#[test]
fn ecs_requests_without_cluster_target_default_cluster() {
    let produced = changes(
        "ecs.amazonaws.com",
        "RunTask",
        json!({"requestParameters": {"taskDefinition": "web:3"}}),
    );

    assert_eq!(
        ids(&produced),
        vec!["arn:aws:ecs:us-east-1:123456789012:cluster/default"]
    );
}

#[test]
fn ecs_unnamed_cluster_creation_targets_default_cluster() {
    let produced = changes(
        "ecs.amazonaws.com",
        "CreateCluster",
        json!({"requestParameters": {}}),
    );

    assert_eq!(
        ids(&produced),
        vec!["arn:aws:ecs:us-east-1:123456789012:cluster/default"]
    );
}

#[test]
fn dynamodb_global_table_fans_out_per_replica_region() {
    let produced = changes(
        "dynamodb.amazonaws.com",
        "CreateGlobalTable",
        json!({"requestParameters": {
            "globalTableName": "orders",
            "replicationGroup": [{"regionName": "us-east-1"}, {"regionName": "eu-west-1"}]
        }}),
    );

    assert_eq!(
        ids(&produced),
        vec![
            "arn:aws:dynamodb:us-east-1:123456789012:table/orders",
            "arn:aws:dynamodb:eu-west-1:123456789012:table/orders",
        ]
    );
    assert_eq!(produced[1].region(), "eu-west-1");
}

#[test]
fn dynamodb_replica_removal_deletes_regional_table() {
    let produced = changes(
        "dynamodb.amazonaws.com",
        "UpdateTable",
        json!({"requestParameters": {
            "tableName": "orders",
            "replicaUpdates": [{"delete": {"regionName": "ap-south-1"}}]
        }}),
    );

    assert_eq!(produced.len(), 2);
    assert!(!produced[0].is_delete());
    assert!(produced[1].is_delete());
    assert_eq!(produced[1].region(), "ap-south-1");
}

#[test]
fn unsupported_source_and_unknown_action_are_unmapped() {
    assert_eq!(
        classify_in("us-east-1", "sqs.amazonaws.com", "CreateQueue", json!({})),
        Classification::Unmapped
    );
    assert_eq!(
        classify_in("us-east-1", "s3.amazonaws.com", "PutObject", json!({})),
        Classification::Unmapped
    );
}

#[test]
fn missing_identifier_is_malformed() {
    let outcome = classify_in(
        "us-east-1",
        "s3.amazonaws.com",
        "PutBucketPolicy",
        json!({"requestParameters": {"bucketName": ""}}),
    );

    assert!(matches!(outcome, Classification::Malformed(_)));
}

#[test]
fn lambda_event_names_lose_api_version_suffix() {
    let produced = changes(
        "lambda.amazonaws.com",
        "UpdateFunctionConfiguration20150331v2",
        json!({"requestParameters": {"functionName": "thumbnailer"}}),
    );

    assert_eq!(
        ids(&produced),
        vec!["arn:aws:lambda:us-east-1:123456789012:function:thumbnailer"]
    );
    assert_eq!(produced[0].event_name(), "UpdateFunctionConfiguration");
}

#[test]
fn lambda_version_delete_is_an_update() {
    let version = changes(
        "lambda.amazonaws.com",
        "DeleteFunction20150331",
        json!({"requestParameters": {"functionName": "thumbnailer", "qualifier": "4"}}),
    );
    let function = changes(
        "lambda.amazonaws.com",
        "DeleteFunction20150331",
        json!({"requestParameters": {"functionName": "thumbnailer"}}),
    );

    assert!(!version[0].is_delete());
    assert!(function[0].is_delete());
}

#[test]
fn lambda_version_in_function_name_is_an_update() {
    for reference in [
        "thumbnailer:4",
        "arn:aws:lambda:us-east-1:123456789012:function:thumbnailer:7",
    ] {
        let produced = changes(
            "lambda.amazonaws.com",
            "DeleteFunction20150331",
            json!({"requestParameters": {"functionName": reference}}),
        );

        assert_eq!(
            ids(&produced),
            vec!["arn:aws:lambda:us-east-1:123456789012:function:thumbnailer"]
        );
        assert!(!produced[0].is_delete(), "{reference} deleted the function");
    }
}

#[test]
fn kms_alias_reference_scans_region_and_never_deletes() {
    let alias = changes(
        "kms.amazonaws.com",
        "DisableKey",
        json!({"requestParameters": {"keyId": "alias/payments"}}),
    );
    assert_eq!(alias[0].scope(), ChangeScope::Region);

    let scheduled = changes(
        "kms.amazonaws.com",
        "ScheduleKeyDeletion",
        json!({"requestParameters": {"keyId": "1234abcd-12ab-34cd-56ef-1234567890ab"}}),
    );
    assert_eq!(
        ids(&scheduled),
        vec!["arn:aws:kms:us-east-1:123456789012:key/1234abcd-12ab-34cd-56ef-1234567890ab"]
    );
    assert!(!scheduled[0].is_delete());
}

#[test]
fn cloudformation_drift_detection_is_delayed() {
    let produced = changes(
        "cloudformation.amazonaws.com",
        "DetectStackDrift",
        json!({"requestParameters": {
            "stackName": "arn:aws:cloudformation:us-east-1:123456789012:stack/app/5f1c"
        }}),
    );

    assert_eq!(produced[0].delay_seconds(), 120);
    assert_eq!(produced[0].scope(), ChangeScope::Resource);
}

#[test]
fn cloudformation_stack_name_falls_back_to_region_scan() {
    let produced = changes(
        "cloudformation.amazonaws.com",
        "UpdateStack",
        json!({"requestParameters": {"stackName": "app"}}),
    );

    assert_eq!(produced[0].scope(), ChangeScope::Region);
}

#[test]
fn eks_cluster_create_is_delayed() {
    let produced = changes(
        "eks.amazonaws.com",
        "CreateCluster",
        json!({"requestParameters": {"name": "platform"}}),
    );

    assert_eq!(
        ids(&produced),
        vec!["arn:aws:eks:us-east-1:123456789012:cluster/platform"]
    );
    assert_eq!(produced[0].delay_seconds(), 300);
}

#[test]
fn iam_user_rename_deletes_old_identity() {
    let produced = changes(
        "iam.amazonaws.com",
        "UpdateUser",
        json!({"requestParameters": {"userName": "alice", "newUserName": "alice.ops"}}),
    );

    assert_eq!(
        ids(&produced),
        vec![
            "arn:aws:iam::123456789012:user/alice",
            "arn:aws:iam::123456789012:user/alice.ops",
        ]
    );
    assert!(produced[0].is_delete());
    assert!(!produced[1].is_delete());
    assert!(produced.iter().all(|change| change.region().is_empty()));
}

#[test]
fn iam_credential_change_without_user_targets_root_caller() {
    let produced = changes(
        "iam.amazonaws.com",
        "CreateAccessKey",
        json!({"userIdentity": {"type": "Root"}, "requestParameters": null}),
    );

    assert_eq!(ids(&produced), vec!["123456789012::AWS.IAM.RootUser"]);
}

#[test]
fn iam_policy_attachment_updates_both_sides() {
    let produced = changes(
        "iam.amazonaws.com",
        "AttachRolePolicy",
        json!({"requestParameters": {
            "roleName": "deployer",
            "policyArn": "arn:aws:iam::aws:policy/ReadOnlyAccess"
        }}),
    );

    assert_eq!(
        ids(&produced),
        vec![
            "arn:aws:iam::123456789012:role/deployer",
            "arn:aws:iam::aws:policy/ReadOnlyAccess",
        ]
    );
}

#[test]
fn password_policy_targets_account_resource() {
    let produced = changes(
        "iam.amazonaws.com",
        "UpdateAccountPasswordPolicy",
        json!({"requestParameters": {"minimumPasswordLength": 14}}),
    );

    assert_eq!(ids(&produced), vec!["123456789012::AWS.PasswordPolicy"]);
}

#[test]
fn redshift_rename_emits_delete_and_update() {
    let produced = changes(
        "redshift.amazonaws.com",
        "ModifyCluster",
        json!({"requestParameters": {
            "clusterIdentifier": "warehouse",
            "newClusterIdentifier": "warehouse-v2"
        }}),
    );

    assert_eq!(
        ids(&produced),
        vec![
            "arn:aws:redshift:us-east-1:123456789012:cluster:warehouse",
            "arn:aws:redshift:us-east-1:123456789012:cluster:warehouse-v2",
        ]
    );
    assert!(produced[0].is_delete());
}

#[test]
fn ec2_run_instances_fans_out_over_response_items() {
    let produced = changes(
        "ec2.amazonaws.com",
        "RunInstances",
        json!({"responseElements": {"instancesSet": {"items": [
            {"instanceId": "i-0a1"},
            {"instanceId": "i-0b2"}
        ]}}}),
    );

    assert_eq!(
        ids(&produced),
        vec![
            "arn:aws:ec2:us-east-1:123456789012:instance/i-0a1",
            "arn:aws:ec2:us-east-1:123456789012:instance/i-0b2",
        ]
    );
}

#[test]
fn ec2_tags_are_routed_by_id_prefix() {
    let produced = changes(
        "ec2.amazonaws.com",
        "CreateTags",
        json!({"requestParameters": {"resourcesSet": {"items": [
            {"resourceId": "sg-12345"},
            {"resourceId": "ami-777"},
            {"resourceId": "snap-999"}
        ]}}}),
    );

    assert_eq!(
        ids(&produced),
        vec![
            "arn:aws:ec2:us-east-1:123456789012:security-group/sg-12345",
            "arn:aws:ec2:us-east-1::image/ami-777",
        ]
    );
}

#[test]
fn security_group_by_name_scans_region() {
    let produced = changes(
        "ec2.amazonaws.com",
        "AuthorizeSecurityGroupIngress",
        json!({"requestParameters": {"groupName": "default"}}),
    );

    assert_eq!(produced[0].scope(), ChangeScope::Region);
    assert_eq!(produced[0].resource_type(), ResourceType::Ec2SecurityGroup);
}

#[test]
fn arns_use_partition_of_event_region() {
    let produced = changes_in(
        "cn-north-1",
        "logs.amazonaws.com",
        "CreateLogGroup",
        json!({"requestParameters": {"logGroupName": "/app/web"}}),
    );

    assert_eq!(
        ids(&produced),
        vec!["arn:aws-cn:logs:cn-north-1:123456789012:log-group:/app/web"]
    );
}

#[test]
fn regional_waf_association_updates_load_balancer() {
    let load_balancer =
        "arn:aws:elasticloadbalancing:us-east-1:123456789012:loadbalancer/app/web/50dc6c495c0c9188";
    let produced = changes(
        "waf-regional.amazonaws.com",
        "AssociateWebACL",
        json!({"requestParameters": {"webACLId": "acl-1", "resourceArn": load_balancer}}),
    );

    assert_eq!(
        ids(&produced),
        vec![
            "arn:aws:waf-regional:us-east-1:123456789012:webacl/acl-1",
            load_balancer,
        ]
    );
}

#[test]
fn global_waf_rule_change_scans_every_web_acl() {
    let produced = changes(
        "waf.amazonaws.com",
        "UpdateRule",
        json!({"requestParameters": {"ruleId": "rule-1"}}),
    );

    assert_eq!(produced[0].scope(), ChangeScope::Account);
    assert_eq!(produced[0].resource_type(), ResourceType::WafWebAcl);
}

#[test]
fn waf_tags_reach_only_web_acls() {
    let web_acl = "arn:aws:waf-regional:us-east-1:123456789012:webacl/acl-1";
    let tagged_acl = changes(
        "waf-regional.amazonaws.com",
        "TagResource",
        json!({"requestParameters": {"resourceARN": web_acl}}),
    );
    let tagged_rule = changes(
        "waf-regional.amazonaws.com",
        "TagResource",
        json!({"requestParameters": {
            "resourceARN": "arn:aws:waf-regional:us-east-1:123456789012:ratebasedrule/rule-1"
        }}),
    );

    assert_eq!(ids(&tagged_acl), vec![web_acl]);
    assert!(tagged_rule.is_empty());
}

#[test]
fn cloudtrail_meta_accompanies_trail_changes() {
    let produced = changes(
        "cloudtrail.amazonaws.com",
        "StopLogging",
        json!({"requestParameters": {"name": "org-trail"}}),
    );

    assert_eq!(
        ids(&produced),
        vec![
            "arn:aws:cloudtrail:us-east-1:123456789012:trail/org-trail",
            "123456789012::AWS.CloudTrail.Meta",
        ]
    );
}

#[test]
fn guardduty_detector_is_a_regional_singleton() {
    let produced = changes_in(
        "eu-west-1",
        "guardduty.amazonaws.com",
        "DeleteDetector",
        json!({"requestParameters": {"detectorId": "12abc34d567e8fa901bc2d34e56789f0"}}),
    );

    assert_eq!(
        ids(&produced),
        vec![
            "123456789012:eu-west-1:AWS.GuardDuty.Detector",
            "123456789012::AWS.GuardDuty.Detector.Meta",
        ]
    );
    assert!(produced[0].is_delete());
}
