//! Model and state machine for the music plugin.

use serde::Serialize;

use crate::machine::StateMachine;

use super::messages::NoteMessage;

/// The score, in playback order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreModel {
    pub notes: Vec<NoteMessage>,
}

impl ScoreModel {
    /// Total duration of the score in beats.
    pub fn total_beats(&self) -> f64 {
        self.notes.iter().map(|n| n.duration).sum()
    }
}

/// Appends each received note to the score.
pub struct MusicMachine;

impl StateMachine for MusicMachine {
    type Message = NoteMessage;
    type Model = ScoreModel;

    fn initial(&self) -> ScoreModel {
        ScoreModel::default()
    }

    fn reduce(&self, model: &mut ScoreModel, message: NoteMessage) {
        model.notes.push(message);
    }
}
