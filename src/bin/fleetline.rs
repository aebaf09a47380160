//! fleetline: partitioned fleet services in one process
//!
//! Starts `cluster.nodes` nodes around one shared in-memory log. Every node
//! serves the client API and the peer RPC surface on its own port.
//!
//! ## Configuration
//! - FLEETLINE_CONFIG: YAML config file (default: ./fleetline.yaml if present)
//! - FLEETLINE__*: overrides, e.g. FLEETLINE__CLUSTER__NODES=3
//! - FLEETLINE_LOG: tracing filter (default: info)
//!
//! An optional first argument names a config file.

use tracing::info;

use fleetline::config::Config;
use fleetline::domain::Domain;
use fleetline::node::Cluster;
use fleetline::processor::{CarProcessor, CommandProcessor, TravelerProcessor};
use fleetline::utils::bootstrap::{init_tracing, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let path = std::env::args().nth(1);
    let config = Config::load(path.as_deref())?;
    info!(
        domain = %config.domain,
        nodes = config.cluster.nodes,
        partitions = config.cluster.partitions,
        "Starting fleetline"
    );

    match config.domain {
        Domain::Traveler => run(&config, TravelerProcessor).await?,
        Domain::Car => run(&config, CarProcessor).await?,
    }
    Ok(())
}

async fn run<P: CommandProcessor>(config: &Config, processor: P) -> fleetline::Result<()> {
    let cluster = Cluster::launch(config, processor).await?;
    for addr in cluster.addrs() {
        info!(node = %addr, "Serving {}", addr.base_url());
    }

    shutdown_signal().await;
    cluster.shutdown().await;
    Ok(())
}
