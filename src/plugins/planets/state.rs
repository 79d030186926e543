//! Model and state machine for the planets plugin.

use serde::Serialize;

use crate::machine::StateMachine;

use super::messages::PlanetMessage;

/// The planetary system, in insertion order.
///
/// A freshly mounted (or reset) system already contains one default
/// planet so the view is never empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanetModel {
    pub planets: Vec<PlanetMessage>,
}

impl Default for PlanetModel {
    fn default() -> Self {
        Self {
            planets: vec![PlanetMessage {
                color: "red".to_string(),
                name: "mars".to_string(),
                radius: 100.0,
                speed: 10.0,
                size: 100.0,
            }],
        }
    }
}

/// Appends each received planet to the system.
pub struct PlanetsMachine;

impl StateMachine for PlanetsMachine {
    type Message = PlanetMessage;
    type Model = PlanetModel;

    fn initial(&self) -> PlanetModel {
        PlanetModel::default()
    }

    fn reduce(&self, model: &mut PlanetModel, message: PlanetMessage) {
        model.planets.push(message);
    }
}
