use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::{AggregationKey, ResourceChange};

/// Result of merging one change into a [`ChangeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No change existed for the key yet.
    Inserted,
    /// The new change was strictly newer and replaced the stored one.
    Replaced,
    /// The stored change was at least as new; the new one was discarded.
    Superseded,
}

/// Batch-wide map of resource changes keyed by aggregation identity.
///
/// Keeps only the newest change per key. Event times are compared as the
/// provider's fixed-width timestamp strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: BTreeMap<AggregationKey, ResourceChange>,
}

impl ChangeSet {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges one change, keeping whichever is newest for its key.
    pub fn merge(&mut self, change: ResourceChange) -> MergeOutcome {
        match self.changes.entry(change.aggregation_key()) {
            Entry::Vacant(entry) => {
                entry.insert(change);
                MergeOutcome::Inserted
            }
            Entry::Occupied(mut entry) => {
                if change.event_time() > entry.get().event_time() {
                    entry.insert(change);
                    MergeOutcome::Replaced
                } else {
                    MergeOutcome::Superseded
                }
            }
        }
    }

    /// Returns the stored change for one key.
    #[must_use]
    pub fn get(&self, key: &AggregationKey) -> Option<&ResourceChange> {
        self.changes.get(key)
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns whether no change has been merged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterates stored changes in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceChange> {
        self.changes.values()
    }
}

impl Extend<ResourceChange> for ChangeSet {
    fn extend<T: IntoIterator<Item = ResourceChange>>(&mut self, iter: T) {
        for change in iter {
            self.merge(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tripwire_core::AccountId;

    use super::{ChangeSet, MergeOutcome};
    use crate::{AuditEventMetadata, ResourceChange, ResourceType};

    fn metadata(event_name: &str) -> AuditEventMetadata {
        AuditEventMetadata::new(
            AccountId::new("111111111111").unwrap_or_else(|_| unreachable!()),
            "us-east-1",
            "s3.amazonaws.com",
            event_name,
        )
        .unwrap_or_else(|_| unreachable!())
    }

    fn bucket_change(event_name: &str, event_time: &str) -> ResourceChange {
        let mut change = ResourceChange::resource(
            &metadata(event_name),
            ResourceType::S3Bucket,
            "arn:aws:s3:::example",
        );
        change.stamp(event_time, "integration-1");
        change
    }

    #[test]
    fn newer_event_replaces_older() {
        let mut changes = ChangeSet::new();
        assert_eq!(
            changes.merge(bucket_change("PutBucketAcl", "2024-01-01T00:00:00Z")),
            MergeOutcome::Inserted
        );
        assert_eq!(
            changes.merge(bucket_change("DeleteBucket", "2024-01-01T00:00:05Z").deleted()),
            MergeOutcome::Replaced
        );

        assert_eq!(changes.len(), 1);
        let stored = changes.iter().next();
        assert!(stored.is_some_and(|change| change.is_delete()));
    }

    #[test]
    fn equal_event_time_keeps_first() {
        let mut changes = ChangeSet::new();
        changes.merge(bucket_change("PutBucketAcl", "2024-01-01T00:00:00Z"));
        assert_eq!(
            changes.merge(bucket_change("PutBucketPolicy", "2024-01-01T00:00:00Z")),
            MergeOutcome::Superseded
        );

        let stored = changes.iter().next();
        assert!(stored.is_some_and(|change| change.event_name() == "PutBucketAcl"));
    }

    #[test]
    fn same_id_in_different_regions_is_kept_apart() {
        let mut changes = ChangeSet::new();
        changes.merge(bucket_change("PutBucketAcl", "2024-01-01T00:00:00Z"));
        changes.merge(
            bucket_change("PutBucketAcl", "2024-01-01T00:00:00Z").in_region("eu-west-1"),
        );

        assert_eq!(changes.len(), 2);
    }

    fn timestamp(seconds: u32) -> String {
        format!(
            "2024-01-01T{:02}:{:02}:{:02}Z",
            seconds / 3600,
            (seconds / 60) % 60,
            seconds % 60
        )
    }

    proptest! {
        #[test]
        fn final_entry_is_the_newest_regardless_of_order(
            seconds in proptest::collection::vec(0_u32..86_400, 1..20),
            rotation in 0_usize..20,
        ) {
            let mut ordered: Vec<ResourceChange> = seconds
                .iter()
                .map(|second| bucket_change("PutBucketAcl", timestamp(*second).as_str()))
                .collect();
            let rotation = rotation % ordered.len();
            ordered.rotate_left(rotation);

            let mut changes = ChangeSet::new();
            changes.extend(ordered);

            let newest = seconds.iter().max().copied().unwrap_or_default();
            let stored = changes.iter().next().map(|change| change.event_time().to_owned());
            prop_assert_eq!(changes.len(), 1);
            prop_assert_eq!(stored, Some(timestamp(newest)));
        }

        #[test]
        fn distinct_keys_do_not_affect_each_other(
            left_seconds in 0_u32..86_400,
            right_seconds in proptest::collection::vec(0_u32..86_400, 0..10),
        ) {
            let left = bucket_change("PutBucketAcl", timestamp(left_seconds).as_str());

            let mut changes = ChangeSet::new();
            changes.merge(left.clone());
            for second in right_seconds {
                let mut other = ResourceChange::region_scan(
                    &metadata("PutBucketAcl"),
                    ResourceType::S3Bucket,
                );
                other.stamp(timestamp(second), "integration-1");
                changes.merge(other);
            }

            prop_assert_eq!(changes.get(&left.aggregation_key()), Some(&left));
        }
    }
}
