//! Planets plugin: user programs grow a small orbital system.

pub mod basic;
pub mod messages;
pub mod state;

use std::sync::Arc;

use crate::capability::ImplementationModule;
use crate::registry::PluginSpec;

pub use messages::PlanetMessage;
pub use state::{PlanetModel, PlanetsMachine};

pub struct Planets;

impl PluginSpec for Planets {
    type Machine = PlanetsMachine;

    fn id() -> &'static str {
        "planets"
    }

    fn machine() -> PlanetsMachine {
        PlanetsMachine
    }

    fn implementations() -> Vec<Arc<dyn ImplementationModule<PlanetMessage>>> {
        vec![Arc::new(basic::BasicImplementation)]
    }
}
