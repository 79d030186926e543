//! Market plugin: user programs shift supply and demand curves and the
//! diagram tracks the resulting equilibrium.

pub mod basic;
pub mod messages;
pub mod state;

use std::sync::Arc;

use crate::capability::ImplementationModule;
use crate::registry::PluginSpec;

pub use messages::MarketMessage;
pub use state::{MarketMachine, MarketModel};

pub struct Market;

impl PluginSpec for Market {
    type Machine = MarketMachine;

    fn id() -> &'static str {
        "market"
    }

    fn machine() -> MarketMachine {
        MarketMachine
    }

    fn implementations() -> Vec<Arc<dyn ImplementationModule<MarketMessage>>> {
        vec![Arc::new(basic::BasicImplementation)]
    }
}
