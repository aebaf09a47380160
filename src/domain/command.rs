use serde::{Deserialize, Serialize};

use super::{Domain, GeoPosition};
use crate::error::{FleetError, Result};

/// A request to change aggregate state.
///
/// Keyed by `command_id` on the command log; processed on the partition of
/// the target aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FleetCommand {
    CreateTraveler {
        command_id: String,
        traveler_id: String,
        name: String,
        email: String,
    },
    DeleteTraveler {
        command_id: String,
        traveler_id: String,
    },
    CreateCar {
        command_id: String,
        car_id: String,
        geo_position: GeoPosition,
        state_of_charge: f64,
    },
    DeleteCar {
        command_id: String,
        car_id: String,
    },
}

impl FleetCommand {
    pub fn command_id(&self) -> &str {
        match self {
            FleetCommand::CreateTraveler { command_id, .. }
            | FleetCommand::DeleteTraveler { command_id, .. }
            | FleetCommand::CreateCar { command_id, .. }
            | FleetCommand::DeleteCar { command_id, .. } => command_id,
        }
    }

    /// Id of the aggregate this command operates on.
    pub fn target_id(&self) -> &str {
        match self {
            FleetCommand::CreateTraveler { traveler_id, .. }
            | FleetCommand::DeleteTraveler { traveler_id, .. } => traveler_id,
            FleetCommand::CreateCar { car_id, .. } | FleetCommand::DeleteCar { car_id, .. } => {
                car_id
            }
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FleetCommand::CreateTraveler { .. } => "CreateTraveler",
            FleetCommand::DeleteTraveler { .. } => "DeleteTraveler",
            FleetCommand::CreateCar { .. } => "CreateCar",
            FleetCommand::DeleteCar { .. } => "DeleteCar",
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            FleetCommand::CreateTraveler { .. } | FleetCommand::DeleteTraveler { .. } => {
                Domain::Traveler
            }
            FleetCommand::CreateCar { .. } | FleetCommand::DeleteCar { .. } => Domain::Car,
        }
    }
}

/// Command as submitted by a client, before a command id is assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CommandRequest {
    CreateTraveler {
        traveler_id: String,
        name: String,
        email: String,
    },
    DeleteTraveler {
        traveler_id: String,
    },
    CreateCar {
        car_id: String,
        geo_position: GeoPosition,
        state_of_charge: f64,
    },
    DeleteCar {
        car_id: String,
    },
}

impl CommandRequest {
    /// Check request fields before anything reaches the log.
    pub fn validate(&self) -> Result<()> {
        match self {
            CommandRequest::CreateTraveler {
                traveler_id,
                name,
                email,
            } => {
                require(!traveler_id.trim().is_empty(), "travelerId")?;
                require(!name.trim().is_empty(), "travelerName")?;
                require(is_plausible_email(email), "travelerEmail")
            }
            CommandRequest::DeleteTraveler { traveler_id } => {
                require(!traveler_id.trim().is_empty(), "travelerId")
            }
            CommandRequest::CreateCar {
                car_id,
                geo_position,
                state_of_charge,
            } => {
                require(!car_id.trim().is_empty(), "carId")?;
                require(geo_position.is_valid(), "geoPosition")?;
                require((0.0..=100.0).contains(state_of_charge), "stateOfCharge")
            }
            CommandRequest::DeleteCar { car_id } => require(!car_id.trim().is_empty(), "carId"),
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            CommandRequest::CreateTraveler { .. } | CommandRequest::DeleteTraveler { .. } => {
                Domain::Traveler
            }
            CommandRequest::CreateCar { .. } | CommandRequest::DeleteCar { .. } => Domain::Car,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(
            self,
            CommandRequest::CreateTraveler { .. } | CommandRequest::CreateCar { .. }
        )
    }

    /// Attach a command id.
    pub fn into_command(self, command_id: String) -> FleetCommand {
        match self {
            CommandRequest::CreateTraveler {
                traveler_id,
                name,
                email,
            } => FleetCommand::CreateTraveler {
                command_id,
                traveler_id,
                name,
                email,
            },
            CommandRequest::DeleteTraveler { traveler_id } => FleetCommand::DeleteTraveler {
                command_id,
                traveler_id,
            },
            CommandRequest::CreateCar {
                car_id,
                geo_position,
                state_of_charge,
            } => FleetCommand::CreateCar {
                command_id,
                car_id,
                geo_position,
                state_of_charge,
            },
            CommandRequest::DeleteCar { car_id } => FleetCommand::DeleteCar { command_id, car_id },
        }
    }
}

fn require(ok: bool, field: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(FleetError::InvalidRequest(format!("{field} invalid")))
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, host)) => !local.is_empty() && !host.is_empty(),
        None => false,
    }
}
