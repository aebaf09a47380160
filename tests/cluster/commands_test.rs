//! Command processing across nodes.

use reqwest::StatusCode;

use crate::common::{client, create_traveler, delete_traveler, get_traveler, launch, post_command};

#[tokio::test]
async fn test_create_then_duplicate_from_another_node() {
    let cluster = launch(3).await;
    let nodes = cluster.addrs();
    let client = client();

    let (status, body) = create_traveler(&client, &nodes[0], "1").await;
    assert_eq!(status, StatusCode::CREATED, "body: {body}");
    let created: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(created["id"], "1");
    assert_eq!(created["state"], "WAITING");

    let (status, body) = create_traveler(&client, &nodes[1], "1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Traveler with id 1 already exists");

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_delete_lifecycle_across_nodes() {
    let cluster = launch(3).await;
    let nodes = cluster.addrs();
    let client = client();

    let (status, body) = delete_traveler(&client, &nodes[2], "42").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Traveler with id 42 did not exist");

    let (status, _) = create_traveler(&client, &nodes[1], "42").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = delete_traveler(&client, &nodes[2], "42").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for node in &nodes {
        let (status, traveler) = get_traveler(&client, node, "42").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(traveler.is_none());
    }

    cluster.shutdown().await;
}

#[tokio::test]
async fn test_malformed_command_is_rejected() {
    let cluster = launch(2).await;
    let nodes = cluster.addrs();
    let client = client();

    let (status, body) = post_command(
        &client,
        &nodes[0],
        serde_json::json!({
            "type": "CreateTraveler",
            "traveler_id": "7",
            "name": "test",
            "email": "no-at-sign"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "travelerEmail invalid");

    let (status, _) = post_command(
        &client,
        &nodes[0],
        serde_json::json!({ "type": "RenameTraveler", "traveler_id": "7" }),
    )
    .await;
    assert!(status.is_client_error());

    cluster.shutdown().await;
}
