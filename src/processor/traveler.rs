use tracing::debug;

use super::{
    already_exists, did_not_exist, rejected, succeeded, unrecognized, CommandProcessor,
    OutputRecord,
};
use crate::domain::{FleetCommand, Traveler, TravelerEvent};
use crate::error::ProcessorError;

/// Handles traveler create/delete commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct TravelerProcessor;

impl CommandProcessor for TravelerProcessor {
    type Aggregate = Traveler;
    type Event = TravelerEvent;

    const NAME: &'static str = "traveler-processor";

    fn process(
        &self,
        command: &FleetCommand,
        current: Option<&Traveler>,
    ) -> Result<Vec<OutputRecord<Traveler, TravelerEvent>>, ProcessorError> {
        let outputs = match (command, current) {
            (FleetCommand::CreateTraveler { traveler_id, .. }, Some(_)) => {
                debug!(traveler_id = %traveler_id, "Traveler already exists");
                rejected(command, already_exists::<Traveler>(traveler_id))
            }
            (
                FleetCommand::CreateTraveler {
                    traveler_id,
                    name,
                    email,
                    ..
                },
                None,
            ) => vec![
                OutputRecord::AggregateUpsert {
                    key: traveler_id.clone(),
                    aggregate: Traveler::new(traveler_id.clone(), name.clone(), email.clone()),
                },
                OutputRecord::EventEmitted {
                    key: traveler_id.clone(),
                    event: TravelerEvent::TravelerCreated {
                        traveler_id: traveler_id.clone(),
                        name: name.clone(),
                        email: email.clone(),
                    },
                },
                succeeded(command),
            ],
            (FleetCommand::DeleteTraveler { traveler_id, .. }, None) => {
                debug!(traveler_id = %traveler_id, "Traveler to delete not found");
                rejected(command, did_not_exist::<Traveler>(traveler_id))
            }
            (FleetCommand::DeleteTraveler { traveler_id, .. }, Some(_)) => vec![
                OutputRecord::AggregateTombstone {
                    key: traveler_id.clone(),
                },
                OutputRecord::EventEmitted {
                    key: traveler_id.clone(),
                    event: TravelerEvent::TravelerDeleted {
                        traveler_id: traveler_id.clone(),
                    },
                },
                succeeded(command),
            ],
            _ => return Err(unrecognized(Self::NAME, command)),
        };
        Ok(outputs)
    }
}
