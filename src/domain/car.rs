use serde::{Deserialize, Serialize};

use super::{Aggregate, Domain};

/// A car in the fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: String,
    pub state: CarState,
    pub geo_position: GeoPosition,
    /// Battery charge, percent.
    pub state_of_charge: f64,
}

impl Car {
    /// New car, out of pool until it is released.
    pub fn new(id: impl Into<String>, geo_position: GeoPosition, state_of_charge: f64) -> Self {
        Self {
            id: id.into(),
            state: CarState::OutOfPool,
            geo_position,
            state_of_charge,
        }
    }
}

impl Aggregate for Car {
    const ENTITY: &'static str = "Car";
    const DOMAIN: Domain = Domain::Car;

    fn id(&self) -> &str {
        &self.id
    }

    fn state_label(&self) -> &'static str {
        self.state.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarState {
    Free,
    OutOfPool,
    Reserved,
    Blocked,
}

impl CarState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarState::Free => "FREE",
            CarState::OutOfPool => "OUT_OF_POOL",
            CarState::Reserved => "RESERVED",
            CarState::Blocked => "BLOCKED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPosition {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Car lifecycle events, keyed by car id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CarEvent {
    CarCreated {
        car_id: String,
        state: CarState,
        geo_position: GeoPosition,
        state_of_charge: f64,
    },
    CarDeleted {
        car_id: String,
    },
}
