use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tripwire_core::{AccountId, AppError, AppResult};
use tripwire_domain::{AuditEventMetadata, ChangeSet, ResourceChange, ResourceType};

use crate::pipeline_ports::{ResourceInventory, ScanQueue, ScheduledScanRequest};

use super::{DispatchService, DispatchSummary};

#[derive(Default)]
struct FakeInventory {
    deleted: Mutex<Vec<Vec<String>>>,
    fail: bool,
}

#[async_trait]
impl ResourceInventory for FakeInventory {
    async fn delete_resources(&self, resource_ids: Vec<String>) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Unavailable("inventory returned 500".to_owned()));
        }
        self.deleted.lock().await.push(resource_ids);
        Ok(())
    }
}

#[derive(Default)]
struct FakeScanQueue {
    sent: Mutex<Vec<ScheduledScanRequest>>,
}

#[async_trait]
impl ScanQueue for FakeScanQueue {
    async fn send_scan_requests(&self, requests: Vec<ScheduledScanRequest>) -> AppResult<()> {
        self.sent.lock().await.extend(requests);
        Ok(())
    }
}

fn metadata(event_name: &str) -> AuditEventMetadata {
    let account_id = AccountId::new("123456789012");
    assert!(account_id.is_ok());
    let metadata = AuditEventMetadata::new(
        account_id.unwrap_or_else(|_| unreachable!()),
        "us-east-1",
        "s3.amazonaws.com",
        event_name,
    );
    assert!(metadata.is_ok());
    metadata.unwrap_or_else(|_| unreachable!())
}

fn stamped(mut change: ResourceChange) -> ResourceChange {
    change.stamp("2026-03-01T10:00:00Z", "integration-1");
    change
}

fn change_set(changes: Vec<ResourceChange>) -> ChangeSet {
    let mut set = ChangeSet::new();
    set.extend(changes.into_iter().map(stamped));
    set
}

#[tokio::test]
async fn empty_change_set_is_a_no_op() {
    let inventory = Arc::new(FakeInventory::default());
    let queue = Arc::new(FakeScanQueue::default());
    let service = DispatchService::new(inventory.clone(), queue.clone());

    let result = service.dispatch(&ChangeSet::new()).await;

    assert!(matches!(result, Ok(summary) if summary == DispatchSummary::default()));
    assert!(inventory.deleted.lock().await.is_empty());
    assert!(queue.sent.lock().await.is_empty());
}

#[tokio::test]
async fn deletes_are_sent_in_one_call_and_scans_grouped_by_delay() {
    let inventory = Arc::new(FakeInventory::default());
    let queue = Arc::new(FakeScanQueue::default());
    let service = DispatchService::new(inventory.clone(), queue.clone());
    let delete = metadata("DeleteBucket");
    let update = metadata("PutBucketPolicy");

    let changes = change_set(vec![
        ResourceChange::resource(&delete, ResourceType::S3Bucket, "arn:aws:s3:::old-a").deleted(),
        ResourceChange::resource(&delete, ResourceType::S3Bucket, "arn:aws:s3:::old-b").deleted(),
        ResourceChange::resource(&update, ResourceType::S3Bucket, "arn:aws:s3:::live"),
        ResourceChange::region_scan(&update, ResourceType::CloudFormationStack).delayed(120),
        ResourceChange::account_scan(&update, ResourceType::IamRole).delayed(120),
    ]);

    let result = service.dispatch(&changes).await;
    assert!(result.is_ok());
    assert_eq!(
        result.unwrap_or_else(|_| unreachable!()),
        DispatchSummary {
            deletes_sent: 2,
            scan_messages_sent: 2,
        }
    );

    assert_eq!(
        *inventory.deleted.lock().await,
        vec![vec![
            "arn:aws:s3:::old-a".to_owned(),
            "arn:aws:s3:::old-b".to_owned(),
        ]]
    );

    let sent = queue.sent.lock().await;
    let delays: Vec<u32> = sent.iter().map(|request| request.delay_seconds).collect();
    assert_eq!(delays, vec![0, 120]);
    assert_eq!(sent[0].request.entries.len(), 1);
    assert_eq!(sent[1].request.entries.len(), 2);
    assert!(
        sent.iter()
            .flat_map(|request| &request.request.entries)
            .all(|entry| !entry.scan_all_resources && entry.integration_id == "integration-1")
    );
}

#[tokio::test]
async fn failed_delete_aborts_before_scans_are_queued() {
    let inventory = Arc::new(FakeInventory {
        fail: true,
        ..FakeInventory::default()
    });
    let queue = Arc::new(FakeScanQueue::default());
    let service = DispatchService::new(inventory, queue.clone());
    let metadata = metadata("DeleteBucket");

    let changes = change_set(vec![
        ResourceChange::resource(&metadata, ResourceType::S3Bucket, "arn:aws:s3:::gone").deleted(),
        ResourceChange::resource(&metadata, ResourceType::S3Bucket, "arn:aws:s3:::kept"),
    ]);

    assert!(service.dispatch(&changes).await.is_err());
    assert!(queue.sent.lock().await.is_empty());
}

#[tokio::test]
async fn delete_without_resource_id_is_skipped() {
    let inventory = Arc::new(FakeInventory::default());
    let queue = Arc::new(FakeScanQueue::default());
    let service = DispatchService::new(inventory.clone(), queue);
    let metadata = metadata("DeleteBucket");

    let changes = change_set(vec![
        ResourceChange::region_scan(&metadata, ResourceType::S3Bucket).deleted(),
    ]);

    let result = service.dispatch(&changes).await;
    assert!(matches!(result, Ok(summary) if summary.deletes_sent == 0));
    assert!(inventory.deleted.lock().await.is_empty());
}
