use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::PeerClient;
use crate::directory::NodeAddr;
use crate::domain::{Aggregate, CommandResponse};
use crate::error::{FleetError, Result};

/// Peer client over HTTP/JSON with a per-call timeout.
pub struct HttpPeerClient<A> {
    client: reqwest::Client,
    _aggregate: PhantomData<fn() -> A>,
}

impl<A> HttpPeerClient<A> {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FleetError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            _aggregate: PhantomData,
        })
    }

    fn url(node: &NodeAddr, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&node.base_url())
            .map_err(|e| FleetError::Config(format!("Invalid peer address {node}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| FleetError::Config(format!("Peer address {node} cannot be a base")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, node: &NodeAddr, url: Url) -> Result<Option<T>> {
        debug!(peer = %node, url = %url, "Peer request");
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(peer = %node, error = %e, "Peer request failed");
            FleetError::Unavailable(format!("{node}: {e}"))
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map(Some)
                .map_err(|e| FleetError::Unavailable(format!("{node}: invalid body: {e}"))),
            status => {
                warn!(peer = %node, status = %status, "Peer returned error status");
                Err(FleetError::Unavailable(format!("{node} returned {status}")))
            }
        }
    }
}

/// Scan endpoints never 404 on a healthy peer.
fn missing_scan_endpoint(node: &NodeAddr) -> FleetError {
    warn!(peer = %node, "Peer has no local scan endpoint");
    FleetError::Unavailable(format!("{node} has no local scan endpoint"))
}

#[async_trait]
impl<A: Aggregate> PeerClient<A> for HttpPeerClient<A> {
    async fn find_by_id(&self, node: &NodeAddr, id: &str) -> Result<Option<A>> {
        let url = Self::url(node, &["local", "aggregates", "by-id", id])?;
        self.get_json(node, url).await
    }

    async fn find_all(&self, node: &NodeAddr) -> Result<Vec<A>> {
        let url = Self::url(node, &["local", "aggregates"])?;
        self.get_json(node, url)
            .await?
            .ok_or_else(|| missing_scan_endpoint(node))
    }

    async fn state_counts(&self, node: &NodeAddr) -> Result<BTreeMap<String, u64>> {
        let url = Self::url(node, &["local", "aggregates", "stats"])?;
        self.get_json(node, url)
            .await?
            .ok_or_else(|| missing_scan_endpoint(node))
    }

    async fn command_response(
        &self,
        node: &NodeAddr,
        command_id: &str,
    ) -> Result<Option<CommandResponse>> {
        let url = Self::url(node, &["local", "command-responses", command_id])?;
        self.get_json(node, url).await
    }
}
