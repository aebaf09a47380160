//! Fleetline - partitioned CQRS/ES services for fleet entities.
//!
//! Commands are appended to a partitioned log, processed by a pure state
//! machine per partition, and materialized into per-node views. Reads are
//! answered by a query router that combines the local partitions with
//! scatter-gather calls to the peers owning the rest.

pub mod api;
pub mod config;
pub mod correlation;
pub mod directory;
pub mod domain;
pub mod error;
pub mod log;
pub mod node;
pub mod partition;
pub mod processor;
pub mod router;
pub mod rpc;
pub mod runtime;
pub mod store;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

pub use error::{FleetError, ProcessorError, Result};
