//! Fleet domain model: aggregates, commands, events, and command responses.

mod car;
mod command;
mod response;
mod traveler;

pub use car::{Car, CarEvent, CarState, GeoPosition};
pub use command::{CommandRequest, FleetCommand};
pub use response::{CommandResponse, CommandStatus};
pub use traveler::{Traveler, TravelerEvent, TravelerState};

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Authoritative current-state object for one entity.
pub trait Aggregate:
    Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Entity name used in rejection reasons, e.g. "Traveler".
    const ENTITY: &'static str;

    /// Domain whose commands create and delete this aggregate.
    const DOMAIN: Domain;

    fn id(&self) -> &str;

    /// Discrete state label counted by the stats view.
    fn state_label(&self) -> &'static str;
}

/// Aggregate type served by a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    #[default]
    Traveler,
    Car,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Traveler => "traveler",
            Domain::Car => "car",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
