//! Command submission and response correlation.
//!
//! A command is appended to the command log and answered asynchronously. The
//! caller polls for the response by command id with bounded exponential
//! backoff. Both "not produced yet" and transient peer failures are retried;
//! once the attempts run out the caller gets `ResponseTimeout`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::Retryable;
use tracing::{debug, info, warn};

use crate::domain::{CommandResponse, FleetCommand};
use crate::error::{FleetError, Result};
use crate::log::PartitionedLog;
use crate::utils::retry::RetryPolicy;

/// Resolves a command response wherever it was materialized.
///
/// Returns `NotFound` when no response is visible yet.
#[async_trait]
pub trait ResponseLookup: Send + Sync {
    async fn find_command_response(&self, command_id: &str) -> Result<CommandResponse>;
}

pub struct CommandGateway {
    commands: Arc<PartitionedLog<FleetCommand>>,
    responses: Arc<dyn ResponseLookup>,
}

impl CommandGateway {
    pub fn new(
        commands: Arc<PartitionedLog<FleetCommand>>,
        responses: Arc<dyn ResponseLookup>,
    ) -> Self {
        Self {
            commands,
            responses,
        }
    }

    /// Append `command` keyed by its command id and return the id.
    pub async fn submit_command(&self, command: FleetCommand) -> Result<String> {
        let command_id = command.command_id().to_string();
        let position = self
            .commands
            .append(command_id.clone(), Some(command))
            .await?;
        info!(
            command_id = %command_id,
            partition = position.partition,
            offset = position.offset,
            "Command submitted"
        );
        Ok(command_id)
    }

    /// Poll for the response to `command_id`.
    pub async fn await_response(
        &self,
        command_id: &str,
        policy: &RetryPolicy,
    ) -> Result<CommandResponse> {
        let attempts = AtomicUsize::new(0);
        let counter = &attempts;
        let responses = &self.responses;
        let result = (|| async move {
            counter.fetch_add(1, Ordering::Relaxed);
            responses.find_command_response(command_id).await
        })
        .retry(policy.backoff())
        .when(|e: &FleetError| e.is_not_found() || e.is_retryable())
        .notify(|e: &FleetError, delay: Duration| {
            debug!(
                command_id = %command_id,
                error = %e,
                delay = ?delay,
                "Response not ready, polling again"
            );
        })
        .await;

        match result {
            Ok(response) => Ok(response),
            Err(e) if e.is_not_found() || e.is_retryable() => {
                let attempts = attempts.load(Ordering::Relaxed);
                warn!(
                    command_id = %command_id,
                    attempts,
                    error = %e,
                    "Gave up waiting for command response"
                );
                Err(FleetError::ResponseTimeout {
                    command_id: command_id.to_string(),
                    attempts,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Submit and wait for the outcome.
    pub async fn execute(
        &self,
        command: FleetCommand,
        policy: &RetryPolicy,
    ) -> Result<CommandResponse> {
        let command_id = self.submit_command(command).await?;
        self.await_response(&command_id, policy).await
    }
}
