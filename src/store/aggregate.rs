//! Per-partition key to aggregate view.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::info;

use crate::domain::Aggregate;
use crate::log::{LogError, PartitionedLog};
use crate::partition::{PartitionId, Partitioner};

/// Materialized current state of the aggregates in the local partitions.
///
/// The single worker owning a partition is its only writer. Reads clone
/// values out and never hold a lock across an await.
pub struct AggregateStore<A> {
    partitioner: Partitioner,
    partitions: Vec<RwLock<HashMap<String, A>>>,
}

impl<A: Aggregate> AggregateStore<A> {
    pub fn new(partitioner: Partitioner) -> Self {
        let partitions = partitioner
            .partitions()
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            partitioner,
            partitions,
        }
    }

    fn slot(&self, key: &str) -> &RwLock<HashMap<String, A>> {
        &self.partitions[self.partitioner.partition_for(key) as usize]
    }

    pub async fn get(&self, key: &str) -> Option<A> {
        self.slot(key).read().await.get(key).cloned()
    }

    /// Every aggregate held locally, in no particular order.
    pub async fn all(&self) -> Vec<A> {
        let mut out = Vec::new();
        for partition in &self.partitions {
            out.extend(partition.read().await.values().cloned());
        }
        out
    }

    /// Insert or replace, returning the previous value.
    pub async fn put(&self, key: &str, aggregate: A) -> Option<A> {
        self.slot(key)
            .write()
            .await
            .insert(key.to_string(), aggregate)
    }

    pub async fn remove(&self, key: &str) -> Option<A> {
        self.slot(key).write().await.remove(key)
    }

    /// Apply one changelog value; `None` is a tombstone.
    pub async fn apply(&self, key: &str, value: Option<A>) -> Option<A> {
        match value {
            Some(aggregate) => self.put(key, aggregate).await,
            None => self.remove(key).await,
        }
    }

    pub async fn len(&self) -> usize {
        let mut total = 0;
        for partition in &self.partitions {
            total += partition.read().await.len();
        }
        total
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Rebuild the given partitions from the changelog.
    ///
    /// Returns the number of records replayed.
    pub async fn restore(
        &self,
        changelog: &PartitionedLog<A>,
        partitions: &[PartitionId],
    ) -> Result<u64, LogError> {
        let mut replayed = 0;
        for &partition in partitions {
            let slot = self.partitions.get(partition as usize).ok_or(
                LogError::PartitionOutOfRange {
                    partition,
                    count: self.partitioner.partition_count(),
                },
            )?;
            let end = changelog.end_offset(partition)?;
            let records = changelog.read_from(partition, 0, end as usize).await?;
            let mut slot = slot.write().await;
            slot.clear();
            for record in records {
                match record.value {
                    Some(aggregate) => {
                        slot.insert(record.key, aggregate);
                    }
                    None => {
                        slot.remove(&record.key);
                    }
                }
                replayed += 1;
            }
        }
        info!(
            log = %changelog.name(),
            partitions = ?partitions,
            replayed,
            "Restored aggregate store"
        );
        Ok(replayed)
    }
}
