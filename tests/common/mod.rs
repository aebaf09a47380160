//! Shared utilities for cluster tests.
//!
//! Launches traveler clusters on ephemeral ports and talks to them the way a
//! client would.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;

use fleetline::config::Config;
use fleetline::directory::NodeAddr;
use fleetline::domain::Traveler;
use fleetline::node::Cluster;
use fleetline::processor::TravelerProcessor;

pub type TravelerCluster = Cluster<TravelerProcessor>;

/// Test settings for `nodes` nodes over six partitions.
pub fn config(nodes: usize) -> Config {
    let mut config = Config::for_test();
    config.cluster.nodes = nodes;
    config.cluster.partitions = 6;
    config
}

pub async fn launch(nodes: usize) -> TravelerCluster {
    launch_with(config(nodes)).await
}

pub async fn launch_with(config: Config) -> TravelerCluster {
    Cluster::launch(&config, TravelerProcessor)
        .await
        .expect("cluster should launch")
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("client should build")
}

pub fn url(node: &NodeAddr, path: &str) -> String {
    format!("http://{}{}", node, path)
}

pub async fn create_traveler(
    client: &reqwest::Client,
    node: &NodeAddr,
    id: &str,
) -> (StatusCode, String) {
    post_command(
        client,
        node,
        json!({
            "type": "CreateTraveler",
            "traveler_id": id,
            "name": format!("traveler {id}"),
            "email": format!("{id}@fleet.test")
        }),
    )
    .await
}

pub async fn delete_traveler(
    client: &reqwest::Client,
    node: &NodeAddr,
    id: &str,
) -> (StatusCode, String) {
    post_command(
        client,
        node,
        json!({ "type": "DeleteTraveler", "traveler_id": id }),
    )
    .await
}

pub async fn post_command(
    client: &reqwest::Client,
    node: &NodeAddr,
    body: serde_json::Value,
) -> (StatusCode, String) {
    let resp = client
        .post(url(node, "/commands"))
        .json(&body)
        .send()
        .await
        .expect("request should complete");
    let status = resp.status();
    (status, resp.text().await.unwrap_or_default())
}

pub async fn get_traveler(
    client: &reqwest::Client,
    node: &NodeAddr,
    id: &str,
) -> (StatusCode, Option<Traveler>) {
    let resp = client
        .get(url(node, &format!("/aggregates/{id}")))
        .send()
        .await
        .expect("request should complete");
    let status = resp.status();
    if status == StatusCode::OK {
        (status, resp.json().await.ok())
    } else {
        (status, None)
    }
}

pub async fn get_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    node: &NodeAddr,
    path: &str,
) -> (StatusCode, Option<T>) {
    let resp = client
        .get(url(node, path))
        .send()
        .await
        .expect("request should complete");
    let status = resp.status();
    if status.is_success() {
        (status, resp.json().await.ok())
    } else {
        (status, None)
    }
}

/// Poll `/aggregates/stats` until `label` reaches `expected`.
pub async fn wait_for_count(
    client: &reqwest::Client,
    node: &NodeAddr,
    label: &str,
    expected: u64,
) -> Option<u64> {
    let mut last = None;
    for _ in 0..200 {
        let (_, stats) =
            get_json::<BTreeMap<String, u64>>(client, node, "/aggregates/stats").await;
        last = stats.and_then(|s| s.get(label).copied());
        if last == Some(expected) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    last
}
