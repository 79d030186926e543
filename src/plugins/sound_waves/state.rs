//! Model and state machine for the sound-waves plugin.

use serde::Serialize;

use crate::machine::StateMachine;

use super::messages::SignalMessage;

/// Ordered board of signals, in the order their messages arrived.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalModel {
    pub signals: Vec<SignalMessage>,
}

impl SignalModel {
    /// Recolors the signal at `idx`. Out-of-range indices are silently
    /// ignored; the renderer's stale click must not corrupt the model.
    pub fn update_color(&mut self, color: &str, idx: usize) {
        if let Some(signal) = self.signals.get_mut(idx) {
            signal.color = Some(color.to_string());
        }
    }

    /// Re-parameterizes the signal at `idx`. Out-of-range indices are
    /// silently ignored.
    pub fn update_harmonic_data(&mut self, harmonic_data: u32, idx: usize) {
        if let Some(signal) = self.signals.get_mut(idx) {
            signal.harmonic_data = harmonic_data;
        }
    }
}

/// Appends each received signal to the board.
pub struct SoundWavesMachine;

impl StateMachine for SoundWavesMachine {
    type Message = SignalMessage;
    type Model = SignalModel;

    fn initial(&self) -> SignalModel {
        SignalModel::default()
    }

    fn reduce(&self, model: &mut SignalModel, message: SignalMessage) {
        model.signals.push(message);
    }
}
