//! Node wiring and in-process cluster bootstrap.
//!
//! A [`Node`] owns a set of partitions: it restores their views from the log,
//! runs their processing units, and serves both the peer RPC surface and the
//! client API. A [`Cluster`] starts several nodes in one process around a
//! shared log, each on its own listener.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api::{self, ApiState};
use crate::config::Config;
use crate::correlation::CommandGateway;
use crate::directory::{NodeAddr, PartitionDirectory, StaticPartitionDirectory};
use crate::domain::Aggregate;
use crate::error::{FleetError, Result};
use crate::log::Topics;
use crate::partition::Partitioner;
use crate::processor::CommandProcessor;
use crate::router::QueryRouter;
use crate::rpc::{self, HttpPeerClient};
use crate::runtime::{spawn_partition_units, Supervisor, SupervisorHandle};
use crate::store::{LocalReads, LocalStores};

/// One cluster member.
pub struct Node<P: CommandProcessor> {
    addr: NodeAddr,
    stores: LocalStores<P::Aggregate>,
    router: QueryRouter<P::Aggregate>,
    gateway: Arc<CommandGateway>,
    config: Config,
    supervisor: SupervisorHandle,
}

impl<P: CommandProcessor> Node<P> {
    /// Restore local views and start processing the partitions the
    /// directory assigns to this node.
    pub async fn start(
        directory: Arc<StaticPartitionDirectory>,
        processor: Arc<P>,
        topics: Topics<P::Aggregate, P::Event>,
        config: &Config,
    ) -> Result<Self> {
        let addr = directory.local_node().clone();
        let partitioner = directory.partitioner();
        let owned = directory.owned_partitions(&addr).await;

        let stores = LocalStores::new(partitioner, config.response_retention());
        stores.aggregates.restore(&topics.changelog, &owned).await?;
        stores
            .responses
            .restore(&topics.command_responses, &owned)
            .await?;
        stores.counts.restore(&topics.state_counts, &owned).await?;

        let mut supervisor = Supervisor::new();
        spawn_partition_units(&mut supervisor, processor, &topics, &stores, &owned)?;
        let supervisor = supervisor.start();

        let peers = HttpPeerClient::<P::Aggregate>::new(config.rpc_timeout())?;
        let local: Arc<dyn LocalReads<P::Aggregate>> = Arc::new(stores.clone());
        let router = QueryRouter::new(directory, local, Arc::new(peers));
        let gateway = Arc::new(CommandGateway::new(
            Arc::clone(&topics.commands),
            Arc::new(router.clone()),
        ));

        info!(
            node = %addr,
            processor = P::NAME,
            partitions = ?owned,
            "Node started"
        );

        Ok(Self {
            addr,
            stores,
            router,
            gateway,
            config: config.clone(),
            supervisor,
        })
    }

    pub fn addr(&self) -> &NodeAddr {
        &self.addr
    }

    pub fn stores(&self) -> &LocalStores<P::Aggregate> {
        &self.stores
    }

    pub fn router(&self) -> &QueryRouter<P::Aggregate> {
        &self.router
    }

    pub fn gateway(&self) -> &Arc<CommandGateway> {
        &self.gateway
    }

    /// Peer RPC and client API routes, traced.
    pub fn app(&self) -> Router {
        let state = Arc::new(ApiState {
            router: self.router.clone(),
            gateway: Arc::clone(&self.gateway),
            polling: self.config.polling,
            query_retry: self.config.query_retry,
        });
        rpc::router::<P::Aggregate>(Arc::new(self.stores.clone()))
            .merge(api::router(state))
            .layer(TraceLayer::new_for_http())
    }

    /// Stop the processing units.
    pub async fn shutdown(self) {
        self.supervisor.shutdown().await;
        info!(node = %self.addr, "Node stopped");
    }
}

struct RunningNode<P: CommandProcessor> {
    node: Node<P>,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl<P: CommandProcessor> RunningNode<P> {
    async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.server.await {
            error!(node = %self.node.addr(), error = %e, "HTTP server task failed");
        }
        self.node.shutdown().await;
    }
}

/// Several nodes in one process sharing one log.
pub struct Cluster<P: CommandProcessor> {
    nodes: Vec<RunningNode<P>>,
}

impl<P: CommandProcessor> Cluster<P> {
    /// Bind every listener, then start the nodes and their HTTP servers.
    ///
    /// With `server.base_port` zero every node gets an ephemeral port.
    pub async fn launch(config: &Config, processor: P) -> Result<Self> {
        config
            .validate()
            .map_err(|e| FleetError::Config(e.to_string()))?;
        if config.domain != <P::Aggregate as Aggregate>::DOMAIN {
            return Err(FleetError::Config(format!(
                "{} cannot serve domain {}",
                P::NAME,
                config.domain
            )));
        }

        let partitioner = Partitioner::new(config.cluster.partitions)?;
        let mut listeners = Vec::with_capacity(config.cluster.nodes);
        let mut addrs = Vec::with_capacity(config.cluster.nodes);
        for i in 0..config.cluster.nodes {
            let port = match config.server.base_port {
                0 => 0,
                base => base.saturating_add(i as u16),
            };
            let listener = TcpListener::bind((config.server.host.as_str(), port)).await?;
            let bound = listener.local_addr()?;
            addrs.push(NodeAddr::new(config.server.host.clone(), bound.port()));
            listeners.push(listener);
        }

        let topics = Topics::new(config.domain.as_str(), partitioner);
        let processor = Arc::new(processor);
        let mut nodes = Vec::with_capacity(addrs.len());
        for (listener, addr) in listeners.into_iter().zip(&addrs) {
            let directory = Arc::new(StaticPartitionDirectory::balanced(
                &addrs,
                partitioner,
                addr.clone(),
            ));
            let node =
                Node::start(directory, Arc::clone(&processor), topics.clone(), config).await?;
            let app = node.app();

            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            let node_addr = addr.clone();
            let server = tokio::spawn(async move {
                let served = axum::serve(listener, app).with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                });
                if let Err(e) = served.await {
                    error!(node = %node_addr, error = %e, "HTTP server error");
                }
            });
            info!(node = %addr, "Listening");

            nodes.push(RunningNode {
                node,
                shutdown_tx,
                server,
            });
        }

        info!(
            domain = %config.domain,
            nodes = nodes.len(),
            partitions = partitioner.partition_count(),
            "Cluster launched"
        );
        Ok(Self { nodes })
    }

    pub fn addrs(&self) -> Vec<NodeAddr> {
        self.nodes.iter().map(|n| n.node.addr().clone()).collect()
    }

    pub fn node(&self, index: usize) -> Option<&Node<P>> {
        self.nodes.get(index).map(|n| &n.node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Stop one node, as if it crashed. Its partitions stay assigned to it.
    pub async fn stop_node(&mut self, index: usize) -> Option<NodeAddr> {
        if index >= self.nodes.len() {
            return None;
        }
        let running = self.nodes.remove(index);
        let addr = running.node.addr().clone();
        running.stop().await;
        Some(addr)
    }

    /// Stop every HTTP server and processing unit.
    pub async fn shutdown(self) {
        for running in self.nodes {
            running.stop().await;
        }
        info!("Cluster stopped");
    }
}
