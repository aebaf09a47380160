//! Stream-processing runtime.
//!
//! Each owned partition runs four sequential units, all tailing the shared
//! log from their own in-memory offset:
//!
//! - the repartitioner rekeys `commands` by target id into `commands_by_target`;
//! - the [`PartitionWorker`] feeds commands to the processor and publishes
//!   its outputs in order;
//! - the response materializer fills the command response view;
//! - the count materializer applies state-count deltas.
//!
//! Units of different partitions run in parallel. A fatal error stops only
//! the unit that hit it.

mod materialize;
mod supervisor;
mod worker;


pub use materialize::{CountMaterializer, Repartitioner, ResponseMaterializer};
pub use supervisor::{Supervisor, SupervisorHandle};
pub use worker::PartitionWorker;

use std::sync::Arc;

use crate::log::{LogError, LogRecord, PartitionedLog, Topics};
use crate::partition::PartitionId;
use crate::processor::CommandProcessor;
use crate::store::LocalStores;

/// Maximum records handed to a unit per read.
pub const BATCH_SIZE: usize = 256;

/// Wait for records at `offset` and read the next batch.
pub async fn next_batch<T: Clone + Send + Sync + 'static>(
    log: &PartitionedLog<T>,
    partition: PartitionId,
    offset: u64,
) -> Result<Vec<LogRecord<T>>, LogError> {
    log.wait_for(partition, offset).await?;
    log.read_from(partition, offset, BATCH_SIZE).await
}

/// Spawn every processing unit for `partitions` on `supervisor`.
///
/// Units start at the current end of their input partitions.
pub fn spawn_partition_units<P: CommandProcessor>(
    supervisor: &mut Supervisor,
    processor: Arc<P>,
    topics: &Topics<P::Aggregate, P::Event>,
    stores: &LocalStores<P::Aggregate>,
    partitions: &[PartitionId],
) -> Result<(), LogError> {
    for &partition in partitions {
        let repartitioner = Repartitioner::new(
            partition,
            Arc::clone(&topics.commands),
            Arc::clone(&topics.commands_by_target),
        )?;
        supervisor.spawn(format!("repartition-{partition}"), repartitioner.run());

        let worker = PartitionWorker::new(
            partition,
            Arc::clone(&processor),
            topics.clone(),
            Arc::clone(&stores.aggregates),
        )?;
        supervisor.spawn(format!("{}-{partition}", P::NAME), worker.run());

        let responses = ResponseMaterializer::new(
            partition,
            Arc::clone(&topics.command_responses),
            Arc::clone(&stores.responses),
        )?;
        supervisor.spawn(format!("responses-{partition}"), responses.run());

        let counts = CountMaterializer::new(
            partition,
            Arc::clone(&topics.state_counts),
            Arc::clone(&stores.counts),
        )?;
        supervisor.spawn(format!("counts-{partition}"), counts.run());
    }
    Ok(())
}
