//! Sound-waves plugin: user programs compose a board of periodic
//! signals that the synth view renders and plays.

pub mod basic;
pub mod messages;
pub mod state;

use std::sync::Arc;

use crate::capability::ImplementationModule;
use crate::registry::PluginSpec;

pub use messages::{SignalMessage, WaveType};
pub use state::{SignalModel, SoundWavesMachine};

pub struct SoundWaves;

impl PluginSpec for SoundWaves {
    type Machine = SoundWavesMachine;

    fn id() -> &'static str {
        "sound-waves"
    }

    fn machine() -> SoundWavesMachine {
        SoundWavesMachine
    }

    fn implementations() -> Vec<Arc<dyn ImplementationModule<SignalMessage>>> {
        vec![Arc::new(basic::BasicImplementation)]
    }
}
