//! Partition ownership.
//!
//! Maps each partition to the node currently hosting it. Routers only read
//! the directory; the membership source replaces assignments when ownership
//! moves.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::error::FleetError;
use crate::partition::{PartitionId, Partitioner};

/// Network address of a node's peer RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeAddr {
    pub host: String,
    pub port: u16,
}

impl NodeAddr {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for NodeAddr {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| FleetError::Config(format!("Invalid node address: {s}")))?;
        if host.is_empty() {
            return Err(FleetError::Config(format!("Invalid node address: {s}")));
        }
        let port = port
            .parse()
            .map_err(|_| FleetError::Config(format!("Invalid port in node address: {s}")))?;
        Ok(Self::new(host, port))
    }
}

/// Which node owns which partition.
#[async_trait]
pub trait PartitionDirectory: Send + Sync {
    /// This process's own address.
    fn local_node(&self) -> &NodeAddr;

    /// The partitioner the stores were materialized with.
    fn partitioner(&self) -> Partitioner;

    async fn owner_of(&self, partition: PartitionId) -> Option<NodeAddr>;

    async fn owner_of_key(&self, key: &str) -> Option<NodeAddr> {
        self.owner_of(self.partitioner().partition_for(key)).await
    }

    /// Distinct nodes owning at least one partition, sorted.
    async fn nodes(&self) -> Vec<NodeAddr>;

    async fn owned_partitions(&self, node: &NodeAddr) -> Vec<PartitionId>;

    fn is_local(&self, node: &NodeAddr) -> bool {
        node == self.local_node()
    }
}

/// Directory with explicitly assigned ownership.
pub struct StaticPartitionDirectory {
    local: NodeAddr,
    partitioner: Partitioner,
    assignments: RwLock<HashMap<PartitionId, NodeAddr>>,
}

impl StaticPartitionDirectory {
    /// Empty directory; every partition starts unowned.
    pub fn new(local: NodeAddr, partitioner: Partitioner) -> Self {
        Self {
            local,
            partitioner,
            assignments: RwLock::new(HashMap::new()),
        }
    }

    /// Round-robin assignment: partition `p` goes to `nodes[p % nodes.len()]`.
    ///
    /// Every node built from the same `nodes` list agrees on ownership.
    pub fn balanced(nodes: &[NodeAddr], partitioner: Partitioner, local: NodeAddr) -> Self {
        let assignments = if nodes.is_empty() {
            HashMap::new()
        } else {
            partitioner
                .partitions()
                .map(|p| (p, nodes[p as usize % nodes.len()].clone()))
                .collect()
        };
        Self {
            local,
            partitioner,
            assignments: RwLock::new(assignments),
        }
    }

    pub async fn assign(&self, partition: PartitionId, node: NodeAddr) -> Result<(), FleetError> {
        if partition >= self.partitioner.partition_count() {
            return Err(FleetError::Config(format!(
                "Partition {partition} out of range"
            )));
        }
        info!(partition, node = %node, "Assigned partition");
        self.assignments.write().await.insert(partition, node);
        Ok(())
    }

    pub async fn unassign(&self, partition: PartitionId) -> Option<NodeAddr> {
        self.assignments.write().await.remove(&partition)
    }

    /// Swap in a complete new ownership table.
    pub async fn replace_assignments(&self, assignments: HashMap<PartitionId, NodeAddr>) {
        let count = assignments.len();
        *self.assignments.write().await = assignments;
        info!(partitions = count, "Replaced partition assignments");
    }
}

#[async_trait]
impl PartitionDirectory for StaticPartitionDirectory {
    fn local_node(&self) -> &NodeAddr {
        &self.local
    }

    fn partitioner(&self) -> Partitioner {
        self.partitioner
    }

    async fn owner_of(&self, partition: PartitionId) -> Option<NodeAddr> {
        self.assignments.read().await.get(&partition).cloned()
    }

    async fn nodes(&self) -> Vec<NodeAddr> {
        let assignments = self.assignments.read().await;
        let distinct: BTreeSet<&NodeAddr> = assignments.values().collect();
        distinct.into_iter().cloned().collect()
    }

    async fn owned_partitions(&self, node: &NodeAddr) -> Vec<PartitionId> {
        let assignments = self.assignments.read().await;
        let mut owned: Vec<PartitionId> = assignments
            .iter()
            .filter(|(_, owner)| *owner == node)
            .map(|(p, _)| *p)
            .collect();
        owned.sort_unstable();
        owned
    }
}
