use std::collections::HashMap;

use chrono::Utc;

use super::*;
use crate::directory::StaticPartitionDirectory;
use crate::domain::Traveler;
use crate::partition::Partitioner;
use crate::store::LocalStores;
use crate::test_utils::{node, sample_traveler, MockPeerClient};

const IDS: [&str; 10] = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10"];

/// Three nodes, three partitions, one store per node.
struct Fixture {
    partitioner: Partitioner,
    nodes: Vec<NodeAddr>,
    stores: HashMap<NodeAddr, LocalStores<Traveler>>,
    peers: Arc<MockPeerClient<Traveler>>,
}

impl Fixture {
    fn new() -> Self {
        let partitioner = Partitioner::new(3).unwrap();
        let nodes = vec![node(9001), node(9002), node(9003)];
        let stores: HashMap<NodeAddr, LocalStores<Traveler>> = nodes
            .iter()
            .map(|n| {
                (
                    n.clone(),
                    LocalStores::new(partitioner, chrono::Duration::hours(1)),
                )
            })
            .collect();
        let peers = Arc::new(MockPeerClient::new(stores.clone()));
        Self {
            partitioner,
            nodes,
            stores,
            peers,
        }
    }

    fn owner(&self, key: &str) -> &NodeAddr {
        let p = self.partitioner.partition_for(key) as usize;
        &self.nodes[p % self.nodes.len()]
    }

    async fn seed(&self) {
        for id in IDS {
            self.stores[self.owner(id)]
                .aggregates
                .put(id, sample_traveler(id))
                .await;
        }
    }

    fn router_at(&self, local: &NodeAddr) -> QueryRouter<Traveler> {
        let directory =
            StaticPartitionDirectory::balanced(&self.nodes, self.partitioner, local.clone());
        QueryRouter::new(
            Arc::new(directory),
            Arc::new(self.stores[local].clone()),
            self.peers.clone(),
        )
    }
}

#[tokio::test]
async fn test_find_by_id_same_answer_from_every_node() {
    let fixture = Fixture::new();
    fixture.seed().await;

    for local in &fixture.nodes {
        let router = fixture.router_at(local);
        for id in IDS {
            assert_eq!(router.find_by_id(id).await.unwrap(), sample_traveler(id));
        }
    }
}

#[tokio::test]
async fn test_local_lookup_makes_no_rpc_and_remote_makes_one() {
    let fixture = Fixture::new();
    fixture.seed().await;

    let id = "1";
    let owner = fixture.owner(id).clone();
    let other = fixture.nodes.iter().find(|n| **n != owner).unwrap().clone();

    fixture.router_at(&owner).find_by_id(id).await.unwrap();
    assert_eq!(fixture.peers.call_count(), 0);

    fixture.router_at(&other).find_by_id(id).await.unwrap();
    assert_eq!(fixture.peers.call_count(), 1);
}

#[tokio::test]
async fn test_find_all_is_union_without_duplicates() {
    let fixture = Fixture::new();
    fixture.seed().await;

    for local in &fixture.nodes {
        let mut ids: Vec<String> = fixture
            .router_at(local)
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();
        ids.sort();
        let mut expected: Vec<String> = IDS.iter().map(|s| s.to_string()).collect();
        expected.sort();
        assert_eq!(ids, expected);
    }
}

#[tokio::test]
async fn test_single_peer_failure_fails_find_all() {
    let fixture = Fixture::new();
    fixture.seed().await;

    let local = fixture.nodes[0].clone();
    fixture.peers.set_failing(&fixture.nodes[2], true).await;

    let err = fixture.router_at(&local).find_all().await.unwrap_err();
    assert!(matches!(err, FleetError::Unavailable(_)));

    let err = fixture.router_at(&local).aggregate_stats().await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_peer_failure_only_affects_its_keys() {
    let fixture = Fixture::new();
    fixture.seed().await;

    let failing = fixture.nodes[2].clone();
    fixture.peers.set_failing(&failing, true).await;
    let router = fixture.router_at(&fixture.nodes[0]);

    for id in IDS {
        let result = router.find_by_id(id).await;
        if *fixture.owner(id) == failing {
            assert!(result.unwrap_err().is_retryable());
        } else {
            assert!(result.is_ok());
        }
    }
}

#[tokio::test]
async fn test_missing_id_is_not_found_locally_and_remotely() {
    let fixture = Fixture::new();
    fixture.seed().await;

    let missing = "does-not-exist";
    let owner = fixture.owner(missing).clone();
    let other = fixture.nodes.iter().find(|n| **n != owner).unwrap().clone();

    for local in [&owner, &other] {
        let err = fixture.router_at(local).find_by_id(missing).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Aggregate not found: id=does-not-exist");
    }
}

#[tokio::test]
async fn test_unowned_partition_is_unavailable() {
    let fixture = Fixture::new();
    let local = fixture.nodes[0].clone();
    let router = QueryRouter::new(
        Arc::new(StaticPartitionDirectory::new(local.clone(), fixture.partitioner)),
        Arc::new(fixture.stores[&local].clone()),
        fixture.peers.clone(),
    );

    let err = router.find_by_id("1").await.unwrap_err();
    assert!(matches!(err, FleetError::Unavailable(_)));

    assert!(router.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stats_union_across_label_owners() {
    let fixture = Fixture::new();
    fixture.stores[fixture.owner("WAITING")]
        .counts
        .apply_delta("WAITING", 4)
        .await;
    fixture.stores[fixture.owner("IN_CAR")]
        .counts
        .apply_delta("IN_CAR", 2)
        .await;

    for local in &fixture.nodes {
        let stats = fixture.router_at(local).aggregate_stats().await.unwrap();
        assert_eq!(stats.get("WAITING"), Some(&4));
        assert_eq!(stats.get("IN_CAR"), Some(&2));
        assert_eq!(stats.len(), 2);
    }
}

#[tokio::test]
async fn test_command_response_lookup_routes_by_command_id() {
    let fixture = Fixture::new();
    let command_id = "0b9a3c4e-6f1d-4c2a-9d8e-1f2a3b4c5d6e";
    fixture.stores[fixture.owner(command_id)]
        .responses
        .record(CommandResponse::succeeded(command_id, "1"), Utc::now())
        .await;

    for local in &fixture.nodes {
        let router = fixture.router_at(local);
        let response = router.find_command_response(command_id).await.unwrap();
        assert_eq!(response.resource_id(), Some("1"));

        let err = router.find_command_response("unknown").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
