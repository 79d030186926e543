//! "basic" language implementation for the sound-waves plugin.

use async_trait::async_trait;
use tracing::debug;

use crate::capability::{CapabilityObject, ImplementationModule, MessageSender};
use crate::plugins::clamp_round;

use super::messages::{SignalMessage, WaveType};

/// Exposes `createSignal(type, data)`.
pub struct BasicImplementation;

#[async_trait]
impl ImplementationModule<SignalMessage> for BasicImplementation {
    fn language_id(&self) -> &str {
        "basic"
    }

    async fn create(&self, sender: MessageSender<SignalMessage>) -> CapabilityObject {
        CapabilityObject::new().operation("createSignal", 2, move |args| {
            let Some(tag) = args[0].as_text() else {
                debug!("createSignal: wave type must be a string, ignoring");
                return;
            };
            let Some(wave_type) = WaveType::parse(tag) else {
                debug!(tag, "createSignal: unknown wave type, ignoring");
                return;
            };
            let Some(data) = args[1].as_number() else {
                debug!("createSignal: harmonic data must be a number, ignoring");
                return;
            };
            let Some(harmonic_data) = clamp_round(data, 0, wave_type.max_harmonic()) else {
                debug!(data, "createSignal: harmonic data not finite, ignoring");
                return;
            };
            sender.send(SignalMessage {
                wave_type,
                harmonic_data,
                color: None,
            });
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{channel, SessionId};
    use crate::lang::Value;

    async fn capabilities() -> (CapabilityObject, crate::channel::EmbedPort) {
        let (host, mut embed) = channel();
        embed.attach();
        let sender = MessageSender::new(host.outbound(), SessionId::new());
        let caps = BasicImplementation.create(sender).await;
        (caps, embed)
    }

    fn create_signal(caps: &CapabilityObject, tag: &str, data: f64) {
        caps.get("createSignal")
            .unwrap()
            .invoke(&[Value::Text(tag.into()), Value::Number(data)]);
    }

    #[tokio::test]
    async fn test_create_signal_sends_message() {
        let (caps, mut embed) = capabilities().await;
        create_signal(&caps, "sine", 3.0);
        let wire = embed.try_recv().unwrap();
        assert_eq!(wire["message"]["waveType"], "sine");
        assert_eq!(wire["message"]["harmonicData"], 3);
    }

    #[tokio::test]
    async fn test_harmonic_data_is_clamped_per_wave_type() {
        let (caps, mut embed) = capabilities().await;

        // Sine supports at most harmonic 10.
        create_signal(&caps, "sine", 99.0);
        assert_eq!(embed.try_recv().unwrap()["message"]["harmonicData"], 10);

        // Square supports up to 50 harmonics.
        create_signal(&caps, "square", 99.0);
        assert_eq!(embed.try_recv().unwrap()["message"]["harmonicData"], 50);

        // Negative values clamp to zero, fractions round.
        create_signal(&caps, "triangle", -4.0);
        assert_eq!(embed.try_recv().unwrap()["message"]["harmonicData"], 0);
        create_signal(&caps, "sawtooth", 6.4);
        assert_eq!(embed.try_recv().unwrap()["message"]["harmonicData"], 6);
    }

    #[tokio::test]
    async fn test_unknown_wave_type_is_a_no_op() {
        let (caps, mut embed) = capabilities().await;
        create_signal(&caps, "noise", 3.0);
        assert!(embed.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_non_numeric_data_is_a_no_op() {
        let (caps, mut embed) = capabilities().await;
        caps.get("createSignal")
            .unwrap()
            .invoke(&[Value::Text("sine".into()), Value::Text("three".into())]);
        assert!(embed.try_recv().is_none());
    }
}
