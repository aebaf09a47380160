use std::sync::Arc;

use tracing::{debug, info};

use super::next_batch;
use crate::domain::{Aggregate, FleetCommand};
use crate::error::Result;
use crate::log::{LogError, Topics};
use crate::partition::PartitionId;
use crate::processor::{CommandProcessor, OutputRecord};
use crate::store::AggregateStore;

/// Single writer for one partition of `commands_by_target`.
pub struct PartitionWorker<P: CommandProcessor> {
    partition: PartitionId,
    processor: Arc<P>,
    topics: Topics<P::Aggregate, P::Event>,
    store: Arc<AggregateStore<P::Aggregate>>,
    offset: u64,
}

impl<P: CommandProcessor> PartitionWorker<P> {
    pub fn new(
        partition: PartitionId,
        processor: Arc<P>,
        topics: Topics<P::Aggregate, P::Event>,
        store: Arc<AggregateStore<P::Aggregate>>,
    ) -> std::result::Result<Self, LogError> {
        let offset = topics.commands_by_target.end_offset(partition)?;
        Ok(Self {
            partition,
            processor,
            topics,
            store,
            offset,
        })
    }

    /// Process commands until a fatal error.
    pub async fn run(mut self) -> Result<()> {
        info!(
            processor = P::NAME,
            partition = self.partition,
            offset = self.offset,
            "Partition worker started"
        );
        loop {
            let batch =
                next_batch(&self.topics.commands_by_target, self.partition, self.offset).await?;
            for record in batch {
                self.offset = record.offset + 1;
                if let Some(command) = record.value {
                    self.handle(&command).await?;
                }
            }
        }
    }

    /// Run one command through the processor and publish its outputs.
    ///
    /// Returns the number of records published.
    #[tracing::instrument(
        name = "worker.handle",
        skip_all,
        fields(
            partition = self.partition,
            command_id = %command.command_id(),
            command_type = command.type_name()
        )
    )]
    pub async fn handle(&self, command: &FleetCommand) -> Result<usize> {
        let current = self.store.get(command.target_id()).await;
        let outputs = self.processor.process(command, current.as_ref())?;
        let published = outputs.len();
        for output in outputs {
            self.publish(output).await?;
        }
        debug!(published, "Command processed");
        Ok(published)
    }

    async fn publish(&self, output: OutputRecord<P::Aggregate, P::Event>) -> Result<()> {
        match output {
            OutputRecord::AggregateUpsert { key, aggregate } => {
                let label = aggregate.state_label();
                let previous = self.store.put(&key, aggregate.clone()).await;
                self.topics
                    .changelog
                    .append(key.clone(), Some(aggregate))
                    .await?;
                match previous.map(|p| p.state_label()) {
                    Some(old) if old == label => {}
                    Some(old) => {
                        self.count_delta(old, -1).await?;
                        self.count_delta(label, 1).await?;
                    }
                    None => self.count_delta(label, 1).await?,
                }
            }
            OutputRecord::AggregateTombstone { key } => {
                let previous = self.store.remove(&key).await;
                self.topics.changelog.append(key, None).await?;
                if let Some(previous) = previous {
                    self.count_delta(previous.state_label(), -1).await?;
                }
            }
            OutputRecord::EventEmitted { key, event } => {
                self.topics.events.append(key, Some(event)).await?;
            }
            OutputRecord::ResponseEmitted { key, response } => {
                self.topics
                    .command_responses
                    .append(key, Some(response))
                    .await?;
            }
        }
        Ok(())
    }

    async fn count_delta(&self, label: &str, delta: i64) -> Result<()> {
        self.topics.state_counts.append(label, Some(delta)).await?;
        Ok(())
    }
}
