//! Error types shared across the crate.
//!
//! Business rejections are not errors: they travel as a REJECTED
//! [`CommandResponse`](crate::domain::CommandResponse). What remains here is
//! definitive absence, transient unavailability, and fatal protocol errors.

use crate::log::LogError;

/// Result type for fleet operations.
pub type Result<T> = std::result::Result<T, FleetError>;

/// Fatal errors raised by a command processor.
///
/// These indicate a routing or versioning bug. They are never turned into a
/// command response and stop the processing unit that hit them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProcessorError {
    #[error("{processor} cannot interpret command of type {command_type}")]
    UnrecognizedCommand {
        processor: &'static str,
        command_type: String,
    },
}

/// Errors surfaced by routing, correlation, and the runtime.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// Single-key lookup absent at the owning partition.
    #[error("Aggregate not found: id={id}")]
    NotFound { id: String },

    /// Peer call failed, timed out, or returned a server error.
    #[error("Service temporarily unavailable: {0}")]
    Unavailable(String),

    /// Command response never materialized within the polling budget.
    #[error("No response for command {command_id} after {attempts} attempts")]
    ResponseTimeout { command_id: String, attempts: usize },

    /// Client request failed validation.
    #[error("{0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error("Log error: {0}")]
    Log(#[from] LogError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FleetError {
    /// Transient failures worth retrying with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FleetError::Unavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FleetError::NotFound { .. })
    }

    /// Errors that must stop the processing unit.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FleetError::Processor(_))
    }
}
