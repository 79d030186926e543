//! Domain messages for the sound-waves plugin.

use serde::{Deserialize, Serialize};

/// Supported periodic wave shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveType {
    Sine,
    Sawtooth,
    Square,
    Triangle,
}

impl WaveType {
    /// Parses the user-facing tag, e.g. `"sine"`. Unknown tags map to
    /// `None` so callers can treat them as a no-op.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "sine" => Some(Self::Sine),
            "sawtooth" => Some(Self::Sawtooth),
            "square" => Some(Self::Square),
            "triangle" => Some(Self::Triangle),
            _ => None,
        }
    }

    /// Upper bound of the harmonic data the synth view can render.
    /// A sine carries a single harmonic number; the other shapes take a
    /// harmonic series length.
    pub fn max_harmonic(self) -> u32 {
        match self {
            Self::Sine => 10,
            Self::Sawtooth | Self::Square | Self::Triangle => 50,
        }
    }
}

/// One signal added to the board.
///
/// `harmonic_data` is either a harmonic number (sine) or a harmonic
/// count (other shapes), already clamped into the supported range by the
/// implementation module. `color` is assigned renderer-side, not by user
/// programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMessage {
    pub wave_type: WaveType,
    pub harmonic_data: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wave_type_parse() {
        assert_eq!(WaveType::parse("sine"), Some(WaveType::Sine));
        assert_eq!(WaveType::parse("triangle"), Some(WaveType::Triangle));
        assert_eq!(WaveType::parse("noise"), None);
        assert_eq!(WaveType::parse("SINE"), None);
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let wire = serde_json::to_value(SignalMessage {
            wave_type: WaveType::Square,
            harmonic_data: 7,
            color: None,
        })
        .unwrap();
        assert_eq!(wire, json!({"waveType": "square", "harmonicData": 7}));
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let message: SignalMessage = serde_json::from_value(json!({
            "waveType": "sine",
            "harmonicData": 3,
            "gainEnvelope": [0, 1, 0]
        }))
        .unwrap();
        assert_eq!(message.wave_type, WaveType::Sine);
        assert_eq!(message.harmonic_data, 3);
    }
}
