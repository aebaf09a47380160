//! Routed reads: every node gives the same answers.

use std::collections::BTreeSet;

use reqwest::StatusCode;

use fleetline::domain::Traveler;

use crate::common::{client, create_traveler, get_json, get_traveler, launch, wait_for_count};

const COUNT: usize = 12;

fn ids() -> Vec<String> {
    (0..COUNT).map(|i| format!("traveler-{i}")).collect()
}

#[tokio::test]
async fn test_find_by_id_is_location_transparent() {
    let cluster = launch(3).await;
    let nodes = cluster.addrs();
    let client = client();

    for (i, id) in ids().iter().enumerate() {
        let (status, _) = create_traveler(&client, &nodes[i % nodes.len()], id).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    for id in ids() {
        let mut seen = Vec::new();
        for node in &nodes {
            let (status, traveler) = get_traveler(&client, node, &id).await;
            assert_eq!(status, StatusCode::OK);
            seen.push(traveler.unwrap());
        }
        assert!(seen.windows(2).all(|w| w[0] == w[1]));
    }

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_find_all_is_disjoint_union_of_local_views() {
    let cluster = launch(3).await;
    let nodes = cluster.addrs();
    let client = client();

    for id in ids() {
        let (status, _) = create_traveler(&client, &nodes[0], &id).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let expected: BTreeSet<String> = ids().into_iter().collect();

    let mut local_union = Vec::new();
    for node in &nodes {
        let (_, local) = get_json::<Vec<Traveler>>(&client, node, "/local/aggregates").await;
        local_union.extend(local.unwrap().into_iter().map(|t| t.id));
    }
    assert_eq!(local_union.len(), COUNT);
    assert_eq!(local_union.into_iter().collect::<BTreeSet<_>>(), expected);

    for node in &nodes {
        let (status, all) = get_json::<Vec<Traveler>>(&client, node, "/aggregates").await;
        assert_eq!(status, StatusCode::OK);
        let all = all.unwrap();
        assert_eq!(all.len(), COUNT);
        assert_eq!(all.into_iter().map(|t| t.id).collect::<BTreeSet<_>>(), expected);
    }

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_stats_agree_on_every_node() {
    let cluster = launch(3).await;
    let nodes = cluster.addrs();
    let client = client();

    for id in ids() {
        create_traveler(&client, &nodes[1], &id).await;
    }

    for node in &nodes {
        let waiting = wait_for_count(&client, node, "WAITING", COUNT as u64).await;
        assert_eq!(waiting, Some(COUNT as u64));
    }

    cluster.shutdown().await;
}
