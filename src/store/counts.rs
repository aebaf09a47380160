//! State label counts.
//!
//! Counts are partitioned by label, so exactly one node holds the count for
//! a given label and merging across nodes is a plain key union.

use std::collections::BTreeMap;

use tokio::sync::RwLock;

use crate::log::{LogError, PartitionedLog};
use crate::partition::PartitionId;

#[derive(Default)]
pub struct StateCountView {
    counts: RwLock<BTreeMap<String, i64>>,
}

impl StateCountView {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn apply_delta(&self, label: &str, delta: i64) {
        let mut counts = self.counts.write().await;
        *counts.entry(label.to_string()).or_insert(0) += delta;
    }

    /// Labels with a positive count.
    pub async fn snapshot(&self) -> BTreeMap<String, u64> {
        self.counts
            .read()
            .await
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(label, count)| (label.clone(), *count as u64))
            .collect()
    }

    /// Rebuild from the delta topic for the given partitions.
    pub async fn restore(
        &self,
        deltas: &PartitionedLog<i64>,
        partitions: &[PartitionId],
    ) -> Result<u64, LogError> {
        let mut replayed = 0;
        for &partition in partitions {
            let end = deltas.end_offset(partition)?;
            for record in deltas.read_from(partition, 0, end as usize).await? {
                if let Some(delta) = record.value {
                    self.apply_delta(&record.key, delta).await;
                    replayed += 1;
                }
            }
        }
        Ok(replayed)
    }
}
