//! In-memory partitioned log.
//!
//! Append-only, keyed records spread over a fixed number of partitions by the
//! shared [`Partitioner`]. Offsets are dense per partition and start at zero.
//! Consumers track their own offset and tail a partition with
//! [`PartitionedLog::wait_for`].
//!
//! A `None` value is a tombstone.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, RwLock};
use tracing::trace;

use crate::domain::{CommandResponse, FleetCommand};
use crate::partition::{PartitionId, Partitioner};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogError {
    #[error("Partition {partition} out of range for log with {count} partitions")]
    PartitionOutOfRange { partition: PartitionId, count: u32 },

    #[error("Log closed")]
    Closed,
}

/// One record as stored in a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord<T> {
    pub partition: PartitionId,
    pub offset: u64,
    pub key: String,
    pub value: Option<T>,
    pub timestamp: DateTime<Utc>,
}

/// Where an appended record landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPosition {
    pub partition: PartitionId,
    pub offset: u64,
}

struct PartitionState<T> {
    records: RwLock<Vec<LogRecord<T>>>,
    /// Next offset to be written.
    high_watermark: watch::Sender<u64>,
}

impl<T> PartitionState<T> {
    fn new() -> Self {
        let (high_watermark, _) = watch::channel(0);
        Self {
            records: RwLock::new(Vec::new()),
            high_watermark,
        }
    }
}

pub struct PartitionedLog<T> {
    name: String,
    partitioner: Partitioner,
    partitions: Vec<PartitionState<T>>,
}

impl<T: Clone + Send + Sync + 'static> PartitionedLog<T> {
    pub fn new(name: impl Into<String>, partitioner: Partitioner) -> Self {
        let partitions = partitioner.partitions().map(|_| PartitionState::new()).collect();
        Self {
            name: name.into(),
            partitioner,
            partitions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partitioner(&self) -> &Partitioner {
        &self.partitioner
    }

    /// Append to the partition that owns `key`.
    pub async fn append(
        &self,
        key: impl Into<String>,
        value: Option<T>,
    ) -> Result<RecordPosition, LogError> {
        let key = key.into();
        let partition = self.partitioner.partition_for(&key);
        self.append_to(partition, key, value).await
    }

    /// Append to an explicit partition.
    pub async fn append_to(
        &self,
        partition: PartitionId,
        key: impl Into<String>,
        value: Option<T>,
    ) -> Result<RecordPosition, LogError> {
        let state = self.partition(partition)?;
        let mut records = state.records.write().await;
        let offset = records.len() as u64;
        records.push(LogRecord {
            partition,
            offset,
            key: key.into(),
            value,
            timestamp: Utc::now(),
        });
        // Publish while holding the lock so watchers never see an offset
        // that is not yet readable.
        state.high_watermark.send_replace(offset + 1);
        trace!(log = %self.name, partition, offset, "Appended record");
        Ok(RecordPosition { partition, offset })
    }

    /// Up to `max` records starting at `offset`.
    pub async fn read_from(
        &self,
        partition: PartitionId,
        offset: u64,
        max: usize,
    ) -> Result<Vec<LogRecord<T>>, LogError> {
        let state = self.partition(partition)?;
        let records = state.records.read().await;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(records.len());
        Ok(records[start..].iter().take(max).cloned().collect())
    }

    /// Offset the next append to `partition` will receive.
    pub fn end_offset(&self, partition: PartitionId) -> Result<u64, LogError> {
        Ok(*self.partition(partition)?.high_watermark.borrow())
    }

    /// Resolves once a record at `offset` exists in `partition`.
    pub async fn wait_for(&self, partition: PartitionId, offset: u64) -> Result<(), LogError> {
        let mut rx = self.partition(partition)?.high_watermark.subscribe();
        rx.wait_for(|end| *end > offset)
            .await
            .map(|_| ())
            .map_err(|_| LogError::Closed)
    }

    fn partition(&self, partition: PartitionId) -> Result<&PartitionState<T>, LogError> {
        self.partitions
            .get(partition as usize)
            .ok_or(LogError::PartitionOutOfRange {
                partition,
                count: self.partitioner.partition_count(),
            })
    }
}

/// The topics one domain's cluster reads and writes.
pub struct Topics<A, E> {
    /// Submitted commands, keyed by command id.
    pub commands: Arc<PartitionedLog<FleetCommand>>,
    /// Commands rekeyed by target aggregate id.
    pub commands_by_target: Arc<PartitionedLog<FleetCommand>>,
    /// Aggregate changelog; tombstones on delete.
    pub changelog: Arc<PartitionedLog<A>>,
    pub events: Arc<PartitionedLog<E>>,
    /// Command responses, keyed by command id.
    pub command_responses: Arc<PartitionedLog<CommandResponse>>,
    /// Count deltas, keyed by state label.
    pub state_counts: Arc<PartitionedLog<i64>>,
}

impl<A, E> Topics<A, E>
where
    A: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new(domain: &str, partitioner: Partitioner) -> Self {
        let topic = |suffix: &str| format!("{domain}-{suffix}");
        Self {
            commands: Arc::new(PartitionedLog::new(topic("commands"), partitioner)),
            commands_by_target: Arc::new(PartitionedLog::new(
                topic("commands-by-target"),
                partitioner,
            )),
            changelog: Arc::new(PartitionedLog::new(topic("changelog"), partitioner)),
            events: Arc::new(PartitionedLog::new(topic("events"), partitioner)),
            command_responses: Arc::new(PartitionedLog::new(
                topic("command-responses"),
                partitioner,
            )),
            state_counts: Arc::new(PartitionedLog::new(topic("state-counts"), partitioner)),
        }
    }
}

impl<A, E> Clone for Topics<A, E> {
    fn clone(&self) -> Self {
        Self {
            commands: Arc::clone(&self.commands),
            commands_by_target: Arc::clone(&self.commands_by_target),
            changelog: Arc::clone(&self.changelog),
            events: Arc::clone(&self.events),
            command_responses: Arc::clone(&self.command_responses),
            state_counts: Arc::clone(&self.state_counts),
        }
    }
}
