//! Test fixtures and mock implementations.
//!
//! `MockPeerClient` answers peer calls straight from other nodes' in-memory
//! views, so router behavior can be tested without sockets.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::directory::NodeAddr;
use crate::domain::{Aggregate, Car, CommandResponse, FleetCommand, GeoPosition, Traveler};
use crate::error::{FleetError, Result};
use crate::rpc::PeerClient;
use crate::store::{LocalReads, LocalStores};

pub fn node(port: u16) -> NodeAddr {
    NodeAddr::new("127.0.0.1", port)
}

pub fn create_traveler(command_id: &str, traveler_id: &str) -> FleetCommand {
    FleetCommand::CreateTraveler {
        command_id: command_id.to_string(),
        traveler_id: traveler_id.to_string(),
        name: "test".to_string(),
        email: "a@a.com".to_string(),
    }
}

pub fn delete_traveler(command_id: &str, traveler_id: &str) -> FleetCommand {
    FleetCommand::DeleteTraveler {
        command_id: command_id.to_string(),
        traveler_id: traveler_id.to_string(),
    }
}

pub fn create_car(command_id: &str, car_id: &str) -> FleetCommand {
    FleetCommand::CreateCar {
        command_id: command_id.to_string(),
        car_id: car_id.to_string(),
        geo_position: GeoPosition::new(52.52, 13.40),
        state_of_charge: 80.0,
    }
}

pub fn delete_car(command_id: &str, car_id: &str) -> FleetCommand {
    FleetCommand::DeleteCar {
        command_id: command_id.to_string(),
        car_id: car_id.to_string(),
    }
}

pub fn sample_traveler(id: &str) -> Traveler {
    Traveler::new(id, "test", "a@a.com")
}

pub fn sample_car(id: &str) -> Car {
    Car::new(id, GeoPosition::new(52.52, 13.40), 80.0)
}

/// Peer client that reads other nodes' stores directly.
pub struct MockPeerClient<A> {
    peers: HashMap<NodeAddr, LocalStores<A>>,
    failing: RwLock<HashSet<NodeAddr>>,
    calls: AtomicUsize,
}

impl<A: Aggregate> MockPeerClient<A> {
    pub fn new(peers: HashMap<NodeAddr, LocalStores<A>>) -> Self {
        Self {
            peers,
            failing: RwLock::new(HashSet::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn set_failing(&self, node: &NodeAddr, fail: bool) {
        let mut failing = self.failing.write().await;
        if fail {
            failing.insert(node.clone());
        } else {
            failing.remove(node);
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn peer(&self, node: &NodeAddr) -> Result<&LocalStores<A>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.read().await.contains(node) {
            return Err(FleetError::Unavailable(format!("{node}: connection refused")));
        }
        self.peers
            .get(node)
            .ok_or_else(|| FleetError::Unavailable(format!("{node}: unknown peer")))
    }
}

#[async_trait]
impl<A: Aggregate> PeerClient<A> for MockPeerClient<A> {
    async fn find_by_id(&self, node: &NodeAddr, id: &str) -> Result<Option<A>> {
        Ok(self.peer(node).await?.find_by_id_local(id).await)
    }

    async fn find_all(&self, node: &NodeAddr) -> Result<Vec<A>> {
        Ok(self.peer(node).await?.find_all_local().await)
    }

    async fn state_counts(&self, node: &NodeAddr) -> Result<BTreeMap<String, u64>> {
        Ok(self.peer(node).await?.state_counts_local().await)
    }

    async fn command_response(
        &self,
        node: &NodeAddr,
        command_id: &str,
    ) -> Result<Option<CommandResponse>> {
        Ok(self.peer(node).await?.command_response_local(command_id).await)
    }
}
