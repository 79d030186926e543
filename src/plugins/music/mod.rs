//! Music plugin: user programs build a score note by note.

pub mod basic;
pub mod messages;
pub mod state;

use std::sync::Arc;

use crate::capability::ImplementationModule;
use crate::registry::PluginSpec;

pub use messages::NoteMessage;
pub use state::{MusicMachine, ScoreModel};

pub struct Music;

impl PluginSpec for Music {
    type Machine = MusicMachine;

    fn id() -> &'static str {
        "music"
    }

    fn machine() -> MusicMachine {
        MusicMachine
    }

    fn implementations() -> Vec<Arc<dyn ImplementationModule<NoteMessage>>> {
        vec![Arc::new(basic::BasicImplementation)]
    }
}
