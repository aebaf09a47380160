//! Partitioned query routing.
//!
//! Point lookups go to exactly one node: the owner of the key's partition.
//! Scans and stats fan out to every owner at once and fail as a whole if any
//! single call fails. No partial results are returned.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::debug;

use crate::correlation::ResponseLookup;
use crate::directory::{NodeAddr, PartitionDirectory};
use crate::domain::{Aggregate, CommandResponse};
use crate::error::{FleetError, Result};
use crate::rpc::PeerClient;
use crate::store::LocalReads;

pub struct QueryRouter<A> {
    directory: Arc<dyn PartitionDirectory>,
    local: Arc<dyn LocalReads<A>>,
    peers: Arc<dyn PeerClient<A>>,
}

impl<A> Clone for QueryRouter<A> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            local: Arc::clone(&self.local),
            peers: Arc::clone(&self.peers),
        }
    }
}

impl<A: Aggregate> QueryRouter<A> {
    pub fn new(
        directory: Arc<dyn PartitionDirectory>,
        local: Arc<dyn LocalReads<A>>,
        peers: Arc<dyn PeerClient<A>>,
    ) -> Self {
        Self {
            directory,
            local,
            peers,
        }
    }

    pub fn directory(&self) -> &Arc<dyn PartitionDirectory> {
        &self.directory
    }

    /// Owner of `key`'s partition, or `Unavailable` if nobody hosts it.
    async fn owner_of_key(&self, key: &str) -> Result<NodeAddr> {
        let partition = self.directory.partitioner().partition_for(key);
        self.directory.owner_of(partition).await.ok_or_else(|| {
            FleetError::Unavailable(format!("No node currently hosts partition {partition}"))
        })
    }

    /// Aggregate with `id`, wherever it lives.
    pub async fn find_by_id(&self, id: &str) -> Result<A> {
        let owner = self.owner_of_key(id).await?;
        let found = if self.directory.is_local(&owner) {
            debug!(id = %id, "Serving lookup locally");
            self.local.find_by_id_local(id).await
        } else {
            debug!(id = %id, owner = %owner, "Forwarding lookup to owner");
            self.peers.find_by_id(&owner, id).await?
        };
        found.ok_or_else(|| FleetError::NotFound { id: id.to_string() })
    }

    /// Every aggregate across all nodes. Order is unspecified.
    pub async fn find_all(&self) -> Result<Vec<A>> {
        let nodes = self.directory.nodes().await;
        debug!(nodes = nodes.len(), "Scatter-gather find_all");
        let calls = nodes.iter().map(|node| async move {
            if self.directory.is_local(node) {
                Ok(self.local.find_all_local().await)
            } else {
                self.peers.find_all(node).await
            }
        });
        let parts = try_join_all(calls).await?;
        Ok(parts.into_iter().flatten().collect())
    }

    /// Count of aggregates per state label across the cluster.
    ///
    /// Each label's count lives on exactly one node, so node results are
    /// merged by key union; a later node's value replaces an earlier one.
    pub async fn aggregate_stats(&self) -> Result<BTreeMap<String, u64>> {
        let nodes = self.directory.nodes().await;
        let calls = nodes.iter().map(|node| async move {
            if self.directory.is_local(node) {
                Ok(self.local.state_counts_local().await)
            } else {
                self.peers.state_counts(node).await
            }
        });
        let parts = try_join_all(calls).await?;
        let mut merged = BTreeMap::new();
        for part in parts {
            merged.extend(part);
        }
        Ok(merged)
    }
}

#[async_trait]
impl<A: Aggregate> ResponseLookup for QueryRouter<A> {
    async fn find_command_response(&self, command_id: &str) -> Result<CommandResponse> {
        let owner = self.owner_of_key(command_id).await?;
        let found = if self.directory.is_local(&owner) {
            self.local.command_response_local(command_id).await
        } else {
            self.peers.command_response(&owner, command_id).await?
        };
        found.ok_or_else(|| FleetError::NotFound {
            id: command_id.to_string(),
        })
    }
}
