//! Peer RPC: node-local reads exposed to the rest of the cluster.
//!
//! The server side answers only from the serving node's own views. Routing
//! is always the caller's job.

mod client;
mod server;

pub use client::HttpPeerClient;
pub use server::router;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::directory::NodeAddr;
use crate::domain::{Aggregate, CommandResponse};
use crate::error::Result;

pub const LOCAL_AGGREGATES_PATH: &str = "/local/aggregates";
pub const LOCAL_STATS_PATH: &str = "/local/aggregates/stats";
/// Point lookups sit under their own prefix so no id can collide with stats.
pub const LOCAL_AGGREGATE_BY_ID_PATH: &str = "/local/aggregates/by-id";
pub const LOCAL_COMMAND_RESPONSES_PATH: &str = "/local/command-responses";

/// Calls to another node's peer endpoint.
///
/// `Ok(None)` is a definitive miss at that node. Scans have no miss: a 404
/// there is `FleetError::Unavailable` like any other failure. Transport failures,
/// timeouts, and server errors come back as `FleetError::Unavailable`.
#[async_trait]
pub trait PeerClient<A: Aggregate>: Send + Sync {
    async fn find_by_id(&self, node: &NodeAddr, id: &str) -> Result<Option<A>>;

    async fn find_all(&self, node: &NodeAddr) -> Result<Vec<A>>;

    async fn state_counts(&self, node: &NodeAddr) -> Result<BTreeMap<String, u64>>;

    async fn command_response(
        &self,
        node: &NodeAddr,
        command_id: &str,
    ) -> Result<Option<CommandResponse>>;
}
