use super::{
    already_exists, did_not_exist, rejected, succeeded, unrecognized, CommandProcessor,
    OutputRecord,
};
use crate::domain::{Car, CarEvent, FleetCommand};
use crate::error::ProcessorError;

/// Handles car create/delete commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarProcessor;

impl CommandProcessor for CarProcessor {
    type Aggregate = Car;
    type Event = CarEvent;

    const NAME: &'static str = "car-processor";

    fn process(
        &self,
        command: &FleetCommand,
        current: Option<&Car>,
    ) -> Result<Vec<OutputRecord<Car, CarEvent>>, ProcessorError> {
        let outputs = match (command, current) {
            (FleetCommand::CreateCar { car_id, .. }, Some(_)) => {
                rejected(command, already_exists::<Car>(car_id))
            }
            (
                FleetCommand::CreateCar {
                    car_id,
                    geo_position,
                    state_of_charge,
                    ..
                },
                None,
            ) => {
                let car = Car::new(car_id.clone(), *geo_position, *state_of_charge);
                let event = CarEvent::CarCreated {
                    car_id: car_id.clone(),
                    state: car.state,
                    geo_position: car.geo_position,
                    state_of_charge: car.state_of_charge,
                };
                vec![
                    OutputRecord::AggregateUpsert {
                        key: car_id.clone(),
                        aggregate: car,
                    },
                    OutputRecord::EventEmitted {
                        key: car_id.clone(),
                        event,
                    },
                    succeeded(command),
                ]
            }
            (FleetCommand::DeleteCar { car_id, .. }, None) => {
                rejected(command, did_not_exist::<Car>(car_id))
            }
            (FleetCommand::DeleteCar { car_id, .. }, Some(_)) => vec![
                OutputRecord::AggregateTombstone {
                    key: car_id.clone(),
                },
                OutputRecord::EventEmitted {
                    key: car_id.clone(),
                    event: CarEvent::CarDeleted {
                        car_id: car_id.clone(),
                    },
                },
                succeeded(command),
            ],
            _ => return Err(unrecognized(Self::NAME, command)),
        };
        Ok(outputs)
    }
}
