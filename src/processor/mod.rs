//! Command processing state machine.
//!
//! A processor is a pure function of `(command, current aggregate)` to an
//! ordered list of output records. The runtime applies the records in order:
//! store mutation first, then the event, then the command response. Given the
//! same inputs a processor always produces the same outputs, which is what
//! makes changelog replay safe.

mod car;
mod traveler;


pub use car::CarProcessor;
pub use traveler::TravelerProcessor;

use std::fmt::Debug;

use serde::Serialize;

use crate::domain::{Aggregate, CommandResponse, FleetCommand};
use crate::error::ProcessorError;

/// One output of processing a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum OutputRecord<A, E> {
    /// New or replaced aggregate value, keyed by aggregate id.
    AggregateUpsert { key: String, aggregate: A },
    /// Aggregate removal, keyed by aggregate id.
    AggregateTombstone { key: String },
    /// Domain event, keyed by aggregate id.
    EventEmitted { key: String, event: E },
    /// Command outcome, keyed by command id.
    ResponseEmitted {
        key: String,
        response: CommandResponse,
    },
}

impl<A, E> OutputRecord<A, E> {
    pub fn key(&self) -> &str {
        match self {
            OutputRecord::AggregateUpsert { key, .. }
            | OutputRecord::AggregateTombstone { key }
            | OutputRecord::EventEmitted { key, .. }
            | OutputRecord::ResponseEmitted { key, .. } => key,
        }
    }

    pub fn response(&self) -> Option<&CommandResponse> {
        match self {
            OutputRecord::ResponseEmitted { response, .. } => Some(response),
            _ => None,
        }
    }
}

/// Pure command handler for one aggregate type.
pub trait CommandProcessor: Send + Sync + 'static {
    type Aggregate: Aggregate;
    type Event: Clone + Debug + PartialEq + Serialize + Send + Sync + 'static;

    /// Name used in logs and fatal errors.
    const NAME: &'static str;

    /// Decide the outputs for `command` given the current aggregate.
    ///
    /// Business rejections come back as `Ok` with a single REJECTED response.
    /// `Err` means the command is not one this processor understands.
    fn process(
        &self,
        command: &FleetCommand,
        current: Option<&Self::Aggregate>,
    ) -> Result<Vec<OutputRecord<Self::Aggregate, Self::Event>>, ProcessorError>;
}

pub(crate) fn already_exists<A: Aggregate>(id: &str) -> String {
    format!("{} with id {} already exists", A::ENTITY, id)
}

pub(crate) fn did_not_exist<A: Aggregate>(id: &str) -> String {
    format!("{} with id {} did not exist", A::ENTITY, id)
}

pub(crate) fn rejected<A, E>(command: &FleetCommand, reason: String) -> Vec<OutputRecord<A, E>> {
    vec![OutputRecord::ResponseEmitted {
        key: command.command_id().to_string(),
        response: CommandResponse::rejected(command.command_id(), reason),
    }]
}

pub(crate) fn succeeded<A, E>(command: &FleetCommand) -> OutputRecord<A, E> {
    OutputRecord::ResponseEmitted {
        key: command.command_id().to_string(),
        response: CommandResponse::succeeded(command.command_id(), command.target_id()),
    }
}

pub(crate) fn unrecognized(processor: &'static str, command: &FleetCommand) -> ProcessorError {
    ProcessorError::UnrecognizedCommand {
        processor,
        command_type: command.type_name().to_string(),
    }
}
