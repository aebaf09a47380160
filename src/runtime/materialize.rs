//! Units that copy log records into another topic or a local view.

use std::sync::Arc;

use tracing::{debug, info};

use super::next_batch;
use crate::domain::{CommandResponse, FleetCommand};
use crate::error::Result;
use crate::log::{LogError, PartitionedLog};
use crate::partition::PartitionId;
use crate::store::{CommandResponseView, StateCountView};

/// Rekeys one partition of `commands` by target id.
pub struct Repartitioner {
    partition: PartitionId,
    commands: Arc<PartitionedLog<FleetCommand>>,
    by_target: Arc<PartitionedLog<FleetCommand>>,
    offset: u64,
}

impl Repartitioner {
    pub fn new(
        partition: PartitionId,
        commands: Arc<PartitionedLog<FleetCommand>>,
        by_target: Arc<PartitionedLog<FleetCommand>>,
    ) -> std::result::Result<Self, LogError> {
        let offset = commands.end_offset(partition)?;
        Ok(Self {
            partition,
            commands,
            by_target,
            offset,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        info!(partition = self.partition, "Repartitioner started");
        loop {
            for record in next_batch(&self.commands, self.partition, self.offset).await? {
                self.offset = record.offset + 1;
                let Some(command) = record.value else {
                    continue;
                };
                let target = command.target_id().to_string();
                let position = self.by_target.append(target, Some(command)).await?;
                debug!(
                    command_id = %record.key,
                    to_partition = position.partition,
                    "Command rekeyed by target"
                );
            }
        }
    }
}

/// Materializes one partition of the responses topic.
pub struct ResponseMaterializer {
    partition: PartitionId,
    log: Arc<PartitionedLog<CommandResponse>>,
    view: Arc<CommandResponseView>,
    offset: u64,
}

impl ResponseMaterializer {
    pub fn new(
        partition: PartitionId,
        log: Arc<PartitionedLog<CommandResponse>>,
        view: Arc<CommandResponseView>,
    ) -> std::result::Result<Self, LogError> {
        let offset = log.end_offset(partition)?;
        Ok(Self {
            partition,
            log,
            view,
            offset,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        loop {
            for record in next_batch(&self.log, self.partition, self.offset).await? {
                self.offset = record.offset + 1;
                if let Some(response) = record.value {
                    self.view.record(response, record.timestamp).await;
                }
            }
        }
    }
}

/// Applies one partition of state-count deltas.
pub struct CountMaterializer {
    partition: PartitionId,
    log: Arc<PartitionedLog<i64>>,
    view: Arc<StateCountView>,
    offset: u64,
}

impl CountMaterializer {
    pub fn new(
        partition: PartitionId,
        log: Arc<PartitionedLog<i64>>,
        view: Arc<StateCountView>,
    ) -> std::result::Result<Self, LogError> {
        let offset = log.end_offset(partition)?;
        Ok(Self {
            partition,
            log,
            view,
            offset,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        loop {
            for record in next_batch(&self.log, self.partition, self.offset).await? {
                self.offset = record.offset + 1;
                if let Some(delta) = record.value {
                    self.view.apply_delta(&record.key, delta).await;
                }
            }
        }
    }
}
