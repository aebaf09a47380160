//! Behavior when a node goes away.

use std::time::Duration;

use reqwest::StatusCode;

use fleetline::domain::Traveler;
use fleetline::partition::Partitioner;
use fleetline::utils::retry::RetryPolicy;

use crate::common::{client, config, create_traveler, get_json, get_traveler, launch_with};

#[tokio::test]
async fn test_one_dead_node_fails_scans_but_not_its_peers_keys() {
    let mut config = config(3);
    config.query_retry = RetryPolicy::new(2, Duration::from_millis(5), Duration::from_millis(10));
    let partitions = config.cluster.partitions;
    let mut cluster = launch_with(config).await;
    let nodes = cluster.addrs();
    let client = client();

    let ids: Vec<String> = (0..12).map(|i| format!("t{i}")).collect();
    for id in &ids {
        let (status, _) = create_traveler(&client, &nodes[0], id).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let dead = cluster.stop_node(2).await.expect("node 2 exists");
    assert_eq!(dead, nodes[2]);

    let (status, all) = get_json::<Vec<Traveler>>(&client, &nodes[0], "/aggregates").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(all.is_none());

    // Partition p is owned by nodes[p % 3]; keys on live owners still resolve.
    let partitioner = Partitioner::new(partitions).unwrap();
    for id in &ids {
        let owner = &nodes[partitioner.partition_for(id) as usize % nodes.len()];
        let (status, _) = get_traveler(&client, &nodes[0], id).await;
        if *owner == dead {
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        } else {
            assert_eq!(status, StatusCode::OK);
        }
    }

    cluster.shutdown().await;
}
