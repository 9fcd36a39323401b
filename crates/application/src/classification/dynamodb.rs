use serde_json::Value;
use tripwire_domain::{AuditEventMetadata, ResourceChange, ResourceType};

use super::support::{arn_in_region, arn_region, arn_resource, field_list, text};
use super::{Classification, ClassificationRule};

pub(super) struct DynamoDbRule;

impl ClassificationRule for DynamoDbRule {
    fn event_source(&self) -> &'static str {
        "dynamodb.amazonaws.com"
    }

    fn classify(&self, detail: &Value, metadata: &AuditEventMetadata) -> Classification {
        match metadata.event_name() {
            "CreateTable"
            | "DeleteTable"
            | "UpdateContinuousBackups"
            | "UpdateContributorInsights"
            | "UpdateTimeToLive" => {
                table_in_event_region(detail, metadata, "/requestParameters/tableName")
            }
            "RestoreTableFromBackup" | "RestoreTableToPointInTime" => {
                table_in_event_region(detail, metadata, "/requestParameters/targetTableName")
            }
            "UpdateTable" => update_table(detail, metadata),
            "TagResource" | "UntagResource" => tagged_table(detail, metadata),
            "CreateGlobalTable" => global_table(
                detail,
                metadata,
                field_list(detail, "/requestParameters/replicationGroup", "regionName"),
            ),
            "UpdateGlobalTable" => {
                // Leaving a legacy global table keeps the regional table in place.
                let mut regions = replica_regions(detail, "create");
                regions.extend(replica_regions(detail, "delete"));
                global_table(detail, metadata, regions)
            }
            "UpdateGlobalTableSettings" => {
                let regions = field_list(
                    detail,
                    "/requestParameters/replicaSettingsUpdate",
                    "regionName",
                );
                if regions.is_empty() {
                    // Table-wide settings touch every replica, which the event does not list.
                    return Classification::single(ResourceChange::account_scan(
                        metadata,
                        ResourceType::DynamoDbTable,
                    ));
                }
                global_table(detail, metadata, regions)
            }
            _ => Classification::Unmapped,
        }
    }
}

fn table_arn(metadata: &AuditEventMetadata, region: &str, table_name: &str) -> String {
    arn_in_region(metadata, "dynamodb", region, format!("table/{table_name}").as_str())
}

fn table_in_event_region(
    detail: &Value,
    metadata: &AuditEventMetadata,
    pointer: &str,
) -> Classification {
    let Some(table_name) = text(detail, pointer) else {
        return Classification::missing(pointer);
    };

    Classification::single(
        ResourceChange::resource(
            metadata,
            ResourceType::DynamoDbTable,
            table_arn(metadata, metadata.region(), table_name),
        )
        .deleted_if(metadata.event_name() == "DeleteTable"),
    )
}

/// Replica regions named under `replicaUpdates[].<operation>.regionName`.
fn replica_regions<'a>(detail: &'a Value, operation: &str) -> Vec<&'a str> {
    detail
        .pointer("/requestParameters/replicaUpdates")
        .and_then(Value::as_array)
        .map(|updates| {
            updates
                .iter()
                .filter_map(|update| update.get(operation))
                .filter_map(|replica| replica.get("regionName"))
                .filter_map(Value::as_str)
                .filter(|region| !region.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn update_table(detail: &Value, metadata: &AuditEventMetadata) -> Classification {
    let pointer = "/requestParameters/tableName";
    let Some(table_name) = text(detail, pointer) else {
        return Classification::missing(pointer);
    };

    let mut changes = vec![ResourceChange::resource(
        metadata,
        ResourceType::DynamoDbTable,
        table_arn(metadata, metadata.region(), table_name),
    )];

    // Current-version global tables manage replicas through UpdateTable; removing a
    // replica deletes the table in that region.
    for (operation, delete) in [("create", false), ("update", false), ("delete", true)] {
        for region in replica_regions(detail, operation) {
            changes.push(
                ResourceChange::resource(
                    metadata,
                    ResourceType::DynamoDbTable,
                    table_arn(metadata, region, table_name),
                )
                .in_region(region)
                .deleted_if(delete),
            );
        }
    }

    Classification::Changes(changes)
}

fn tagged_table(detail: &Value, metadata: &AuditEventMetadata) -> Classification {
    let pointer = "/requestParameters/resourceArn";
    let Some(resource_arn) = text(detail, pointer) else {
        return Classification::missing(pointer);
    };

    let table_name = arn_resource(resource_arn)
        .and_then(|resource| resource.strip_prefix("table/"))
        .and_then(|rest| rest.split('/').next())
        .filter(|name| !name.is_empty());
    let Some(table_name) = table_name else {
        return Classification::Malformed(format!(
            "resource '{resource_arn}' is not a DynamoDB table ARN"
        ));
    };

    let region = arn_region(resource_arn).unwrap_or(metadata.region());
    Classification::single(
        ResourceChange::resource(
            metadata,
            ResourceType::DynamoDbTable,
            table_arn(metadata, region, table_name),
        )
        .in_region(region),
    )
}

fn global_table(
    detail: &Value,
    metadata: &AuditEventMetadata,
    regions: Vec<&str>,
) -> Classification {
    let pointer = "/requestParameters/globalTableName";
    let Some(table_name) = text(detail, pointer) else {
        return Classification::missing(pointer);
    };

    if regions.is_empty() {
        return Classification::Malformed(format!(
            "global table '{table_name}' event lists no replica regions"
        ));
    }

    Classification::Changes(
        regions
            .into_iter()
            .map(|region| {
                ResourceChange::resource(
                    metadata,
                    ResourceType::DynamoDbTable,
                    table_arn(metadata, region, table_name),
                )
                .in_region(region)
            })
            .collect(),
    )
}
