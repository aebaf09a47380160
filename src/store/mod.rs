//! Node-local materialized views and the read seam over them.

mod aggregate;
mod counts;
mod responses;

pub use aggregate::AggregateStore;
pub use counts::StateCountView;
pub use responses::CommandResponseView;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Aggregate, CommandResponse};
use crate::partition::Partitioner;

/// Reads served from this node's own views, without routing.
#[async_trait]
pub trait LocalReads<A: Aggregate>: Send + Sync {
    async fn find_by_id_local(&self, id: &str) -> Option<A>;

    async fn find_all_local(&self) -> Vec<A>;

    async fn state_counts_local(&self) -> BTreeMap<String, u64>;

    async fn command_response_local(&self, command_id: &str) -> Option<CommandResponse>;
}

/// The views a node materializes.
pub struct LocalStores<A> {
    pub aggregates: Arc<AggregateStore<A>>,
    pub counts: Arc<StateCountView>,
    pub responses: Arc<CommandResponseView>,
}

impl<A: Aggregate> LocalStores<A> {
    pub fn new(partitioner: Partitioner, retention: chrono::Duration) -> Self {
        Self {
            aggregates: Arc::new(AggregateStore::new(partitioner)),
            counts: Arc::new(StateCountView::new()),
            responses: Arc::new(CommandResponseView::new(retention)),
        }
    }
}

impl<A> Clone for LocalStores<A> {
    fn clone(&self) -> Self {
        Self {
            aggregates: Arc::clone(&self.aggregates),
            counts: Arc::clone(&self.counts),
            responses: Arc::clone(&self.responses),
        }
    }
}

#[async_trait]
impl<A: Aggregate> LocalReads<A> for LocalStores<A> {
    async fn find_by_id_local(&self, id: &str) -> Option<A> {
        self.aggregates.get(id).await
    }

    async fn find_all_local(&self) -> Vec<A> {
        self.aggregates.all().await
    }

    async fn state_counts_local(&self) -> BTreeMap<String, u64> {
        self.counts.snapshot().await
    }

    async fn command_response_local(&self, command_id: &str) -> Option<CommandResponse> {
        self.responses.get(command_id).await
    }
}
