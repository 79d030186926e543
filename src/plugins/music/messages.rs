//! Domain messages for the music plugin.

use serde::{Deserialize, Serialize};

/// One note appended to the score.
///
/// `note` is pitch notation (letter, optional accidental, octave digit),
/// `duration` is in beats. Both are validated by the implementation
/// module before a message is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMessage {
    pub note: String,
    pub duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let wire = serde_json::to_value(NoteMessage {
            note: "C4".into(),
            duration: 0.5,
        })
        .unwrap();
        assert_eq!(wire, json!({"note": "C4", "duration": 0.5}));
    }
}
