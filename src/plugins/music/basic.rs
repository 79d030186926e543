//! "basic" language implementation for the music plugin.

use async_trait::async_trait;
use tracing::debug;

use crate::capability::{CapabilityObject, ImplementationModule, MessageSender};

use super::messages::NoteMessage;

/// Longest single note the player will schedule, in beats.
const MAX_DURATION: f64 = 16.0;

/// Checks pitch notation: a letter A–G, an optional `#` or `b`
/// accidental, and an octave digit 0–8. E.g. `"C4"`, `"F#3"`, `"Bb5"`.
fn is_valid_note(note: &str) -> bool {
    let mut chars = note.chars();
    match chars.next() {
        Some('A'..='G') => {}
        _ => return false,
    }
    let mut rest = chars.as_str().chars();
    match rest.next() {
        Some('#' | 'b') => {}
        _ => rest = chars.as_str().chars(),
    }
    matches!(rest.next(), Some('0'..='8')) && rest.next().is_none()
}

/// Exposes `playNote(note, duration)`.
pub struct BasicImplementation;

#[async_trait]
impl ImplementationModule<NoteMessage> for BasicImplementation {
    fn language_id(&self) -> &str {
        "basic"
    }

    async fn create(&self, sender: MessageSender<NoteMessage>) -> CapabilityObject {
        CapabilityObject::new().operation("playNote", 2, move |args| {
            let Some(note) = args[0].as_text() else {
                debug!("playNote: note must be a string, ignoring");
                return;
            };
            if !is_valid_note(note) {
                debug!(note, "playNote: not pitch notation, ignoring");
                return;
            }
            let Some(duration) = args[1].as_number() else {
                debug!("playNote: duration must be a number, ignoring");
                return;
            };
            if !duration.is_finite() || duration <= 0.0 {
                debug!(duration, "playNote: duration must be positive, ignoring");
                return;
            }
            sender.send(NoteMessage {
                note: note.to_string(),
                duration: duration.min(MAX_DURATION),
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{channel, SessionId};
    use crate::lang::Value;

    #[test]
    fn test_is_valid_note() {
        assert!(is_valid_note("C4"));
        assert!(is_valid_note("A0"));
        assert!(is_valid_note("F#3"));
        assert!(is_valid_note("Bb5"));
        assert!(is_valid_note("G8"));

        assert!(!is_valid_note(""));
        assert!(!is_valid_note("H4"));
        assert!(!is_valid_note("c4"));
        assert!(!is_valid_note("C9"));
        assert!(!is_valid_note("C#"));
        assert!(!is_valid_note("C44"));
        assert!(!is_valid_note("do"));
    }

    async fn capabilities() -> (CapabilityObject, crate::channel::EmbedPort) {
        let (host, mut embed) = channel();
        embed.attach();
        let sender = MessageSender::new(host.outbound(), SessionId::new());
        let caps = BasicImplementation.create(sender).await;
        (caps, embed)
    }

    fn play(caps: &CapabilityObject, note: &str, duration: f64) {
        caps.get("playNote")
            .unwrap()
            .invoke(&[Value::Text(note.into()), Value::Number(duration)]);
    }

    #[tokio::test]
    async fn test_play_note_sends_message() {
        let (caps, mut embed) = capabilities().await;
        play(&caps, "E4", 0.5);
        let wire = embed.try_recv().unwrap();
        assert_eq!(wire["message"]["note"], "E4");
        assert_eq!(wire["message"]["duration"], 0.5);
    }

    #[tokio::test]
    async fn test_invalid_pitch_is_a_no_op() {
        let (caps, mut embed) = capabilities().await;
        play(&caps, "X9", 1.0);
        play(&caps, "", 1.0);
        assert!(embed.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_non_positive_duration_is_a_no_op() {
        let (caps, mut embed) = capabilities().await;
        play(&caps, "C4", 0.0);
        play(&caps, "C4", -1.0);
        play(&caps, "C4", f64::NAN);
        assert!(embed.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_excessive_duration_is_clamped() {
        let (caps, mut embed) = capabilities().await;
        play(&caps, "C4", 500.0);
        assert_eq!(embed.try_recv().unwrap()["message"]["duration"], 16.0);
    }
}
