//! Command response view with a retention window.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::CommandResponse;
use crate::log::{LogError, PartitionedLog};
use crate::partition::PartitionId;

/// Latest response per command id, for responses younger than `retention`.
///
/// Entries past the window are invisible to reads and dropped on the next
/// write or explicit purge. Callers treat a missing old response the same as
/// one not yet produced.
pub struct CommandResponseView {
    retention: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

#[derive(Debug, Clone)]
struct Entry {
    response: CommandResponse,
    recorded_at: DateTime<Utc>,
}

impl CommandResponseView {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub async fn record(&self, response: CommandResponse, at: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        let cutoff = at - self.retention;
        entries.retain(|_, entry| entry.recorded_at > cutoff);
        entries.insert(
            response.command_id().to_string(),
            Entry {
                response,
                recorded_at: at,
            },
        );
    }

    pub async fn get(&self, command_id: &str) -> Option<CommandResponse> {
        let cutoff = Utc::now() - self.retention;
        self.entries
            .read()
            .await
            .get(command_id)
            .filter(|entry| entry.recorded_at > cutoff)
            .map(|entry| entry.response.clone())
    }

    /// Drop entries recorded at or before `now - retention`.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.retention;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.recorded_at > cutoff);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "Purged expired command responses");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Rebuild from the responses log for the given partitions.
    pub async fn restore(
        &self,
        log: &PartitionedLog<CommandResponse>,
        partitions: &[PartitionId],
    ) -> Result<u64, LogError> {
        let mut replayed = 0;
        for &partition in partitions {
            let end = log.end_offset(partition)?;
            for record in log.read_from(partition, 0, end as usize).await? {
                if let Some(response) = record.value {
                    self.record(response, record.timestamp).await;
                    replayed += 1;
                }
            }
        }
        Ok(replayed)
    }
}
