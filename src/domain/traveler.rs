use serde::{Deserialize, Serialize};

use super::{Aggregate, Domain};

/// A traveler registered with the fleet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traveler {
    pub id: String,
    pub name: String,
    pub email: String,
    pub state: TravelerState,
}

impl Traveler {
    /// New traveler in the initial state.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            state: TravelerState::Waiting,
        }
    }
}

impl Aggregate for Traveler {
    const ENTITY: &'static str = "Traveler";
    const DOMAIN: Domain = Domain::Traveler;

    fn id(&self) -> &str {
        &self.id
    }

    fn state_label(&self) -> &'static str {
        self.state.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelerState {
    Waiting,
    InCar,
    Unknown,
}

impl TravelerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelerState::Waiting => "WAITING",
            TravelerState::InCar => "IN_CAR",
            TravelerState::Unknown => "UNKNOWN",
        }
    }
}

/// Traveler lifecycle events, keyed by traveler id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TravelerEvent {
    TravelerCreated {
        traveler_id: String,
        name: String,
        email: String,
    },
    TravelerDeleted {
        traveler_id: String,
    },
}
