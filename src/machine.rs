//! Plugin state machines and the embed driver that feeds them.
//!
//! A state machine is a pure reducer: the model it owns is reconstructed
//! solely from the ordered inbound message stream plus the `start`
//! control. The [`EmbedDriver`] is the injected message receiver: it
//! decodes envelopes off the channel, enforces session supersedence, and
//! publishes every accepted transition on a `watch` channel, which is
//! the read contract renderers subscribe to.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::channel::{DomainMessage, EmbedNotice, EmbedPort, Envelope, SessionId};
use crate::error::ProtocolViolation;

/// Pure reduction of inbound messages into an observable model.
///
/// `reduce` must be total over the plugin's message set: every declared
/// variant has a defined effect, and effects only ever go through here.
pub trait StateMachine: Send + 'static {
    type Message: DomainMessage;
    type Model: Clone + PartialEq + Serialize + Send + Sync + 'static;

    /// The documented initial model, produced on mount and on `start`.
    fn initial(&self) -> Self::Model;

    /// Applies one domain message. Mutation stays inside the model.
    fn reduce(&self, model: &mut Self::Model, message: Self::Message);
}

/// Drives one plugin instance from the envelope stream.
///
/// Lifecycle: `Uninitialized` until the first `start` control, `Ready`
/// afterwards; any later `start` resets back to the initial model. There
/// is no terminal state; the driver lives until its channel closes.
/// Messages arriving before any `start`, or tagged with a session other
/// than the current one, are dropped and reported as advisory notices.
pub struct EmbedDriver<S: StateMachine> {
    machine: S,
    model: S::Model,
    session: Option<SessionId>,
    port: EmbedPort,
    model_tx: watch::Sender<S::Model>,
}

impl<S: StateMachine> EmbedDriver<S> {
    /// Builds a driver and the model subscription renderers observe.
    ///
    /// Attaches to the channel immediately: from this point on, posted
    /// envelopes are delivered instead of dropped.
    pub fn new(machine: S, port: EmbedPort) -> (Self, watch::Receiver<S::Model>) {
        let model = machine.initial();
        let (model_tx, model_rx) = watch::channel(model.clone());
        port.attach();
        (
            Self {
                machine,
                model,
                session: None,
                port,
                model_tx,
            },
            model_rx,
        )
    }

    /// Consumes envelopes until the host side closes the channel.
    pub async fn run(mut self) {
        while let Some(raw) = self.port.recv().await {
            self.deliver(raw);
        }
        debug!("embed channel closed, driver stopping");
    }

    /// Processes one wire value. Malformed input never fails the driver:
    /// protocol violations are logged and reported, unrecognized payloads
    /// reduce to a no-op, and the model stays valid throughout.
    pub fn deliver(&mut self, raw: serde_json::Value) {
        let envelope: Envelope<serde_json::Value> = match serde_json::from_value(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                let violation = ProtocolViolation::MalformedEnvelope {
                    detail: e.to_string(),
                };
                warn!(%violation, "ignoring malformed envelope");
                self.port.notify(EmbedNotice::Violation(violation));
                return;
            }
        };

        match envelope {
            Envelope::Start { session } => {
                debug!(%session, "start control: resetting model");
                self.session = Some(session);
                self.model = self.machine.initial();
                self.publish();
            }
            Envelope::Message { session, message } => {
                if self.session != Some(session) {
                    debug!(%session, "dropping message from superseded session");
                    self.port.notify(EmbedNotice::Superseded { session });
                    return;
                }
                match serde_json::from_value::<S::Message>(message) {
                    Ok(message) => {
                        self.machine.reduce(&mut self.model, message);
                        self.publish();
                    }
                    Err(e) => {
                        // Absorbed as a no-op so the visible model is
                        // always valid.
                        debug!(error = %e, "unrecognized message payload, ignoring");
                    }
                }
            }
        }
    }

    /// Processes every envelope already queued on the channel. Returns
    /// how many were taken. Lets synchronous callers observe a settled
    /// model without racing the async loop.
    pub fn drain(&mut self) -> usize {
        let mut taken = 0;
        while let Some(raw) = self.port.try_recv() {
            self.deliver(raw);
            taken += 1;
        }
        taken
    }

    /// Applies a model-local operation such as a renderer's point update
    /// (recoloring the i-th entry). These are reducer operations on the
    /// model itself, not new message types; the transition is published
    /// only if the operation actually changed something (out-of-range
    /// updates are silent no-ops).
    pub fn update_model(&mut self, op: impl FnOnce(&mut S::Model)) {
        let before = self.model.clone();
        op(&mut self.model);
        if self.model != before {
            self.publish();
        }
    }

    /// Read access for synchronous callers (tests, local renderers).
    pub fn model(&self) -> &S::Model {
        &self.model
    }

    fn publish(&self) {
        let _ = self.model_tx.send(self.model.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{channel, HostPort};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct CountMessage {
        amount: i64,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    struct CountModel {
        total: i64,
        events: u32,
    }

    struct Counter;

    impl StateMachine for Counter {
        type Message = CountMessage;
        type Model = CountModel;

        fn initial(&self) -> CountModel {
            CountModel::default()
        }

        fn reduce(&self, model: &mut CountModel, message: CountMessage) {
            model.total += message.amount;
            model.events += 1;
        }
    }

    fn driver() -> (EmbedDriver<Counter>, HostPort, watch::Receiver<CountModel>) {
        let (host, embed) = channel();
        let (driver, model_rx) = EmbedDriver::new(Counter, embed);
        (driver, host, model_rx)
    }

    fn start(session: SessionId) -> serde_json::Value {
        Envelope::<CountMessage>::Start { session }.to_wire().unwrap()
    }

    fn message(session: SessionId, amount: i64) -> serde_json::Value {
        Envelope::Message {
            session,
            message: CountMessage { amount },
        }
        .to_wire()
        .unwrap()
    }

    #[tokio::test]
    async fn test_start_then_messages_reduce_in_order() {
        let (mut driver, _host, _rx) = driver();
        let session = SessionId::new();
        driver.deliver(start(session));
        driver.deliver(message(session, 2));
        driver.deliver(message(session, 3));
        assert_eq!(driver.model(), &CountModel { total: 5, events: 2 });
    }

    #[tokio::test]
    async fn test_messages_before_start_are_dropped() {
        let (mut driver, mut host, _rx) = driver();
        let session = SessionId::new();
        driver.deliver(message(session, 7));
        assert_eq!(driver.model(), &CountModel::default());
        assert_eq!(
            host.recv_notice().await,
            Some(EmbedNotice::Superseded { session })
        );
    }

    #[tokio::test]
    async fn test_start_resets_from_any_state() {
        let (mut driver, _host, _rx) = driver();
        let session = SessionId::new();
        driver.deliver(start(session));
        driver.deliver(message(session, 9));
        assert_ne!(driver.model(), &CountModel::default());

        let next = SessionId::new();
        driver.deliver(start(next));
        assert_eq!(driver.model(), &CountModel::default());
    }

    #[tokio::test]
    async fn test_superseded_session_messages_are_dropped() {
        let (mut driver, _host, _rx) = driver();
        let old = SessionId::new();
        driver.deliver(start(old));
        driver.deliver(message(old, 1));

        let new = SessionId::new();
        driver.deliver(start(new));
        // Late message from the superseded generation.
        driver.deliver(message(old, 100));
        assert_eq!(driver.model(), &CountModel { total: 0, events: 0 });

        driver.deliver(message(new, 4));
        assert_eq!(driver.model(), &CountModel { total: 4, events: 1 });
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_a_logged_no_op() {
        let (mut driver, mut host, _rx) = driver();
        let session = SessionId::new();
        driver.deliver(start(session));
        driver.deliver(message(session, 2));

        driver.deliver(json!({"type": "detonate"}));
        driver.deliver(json!("not even an object"));
        assert_eq!(driver.model(), &CountModel { total: 2, events: 1 });

        match host.recv_notice().await {
            Some(EmbedNotice::Violation(_)) => {}
            other => panic!("expected violation notice, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unrecognized_payload_is_a_no_op() {
        let (mut driver, _host, _rx) = driver();
        let session = SessionId::new();
        driver.deliver(start(session));
        let bad = Envelope::Message {
            session,
            message: json!({"amount": "not a number"}),
        }
        .to_wire()
        .unwrap();
        driver.deliver(bad);
        assert_eq!(driver.model(), &CountModel::default());
    }

    #[tokio::test]
    async fn test_unknown_fields_are_ignored_not_rejected() {
        let (mut driver, _host, _rx) = driver();
        let session = SessionId::new();
        driver.deliver(start(session));
        let extra = Envelope::Message {
            session,
            message: json!({"amount": 3, "futureField": true}),
        }
        .to_wire()
        .unwrap();
        driver.deliver(extra);
        assert_eq!(driver.model(), &CountModel { total: 3, events: 1 });
    }

    #[tokio::test]
    async fn test_run_loop_consumes_channel() {
        let (host, embed) = channel();
        let (driver, mut model_rx) = EmbedDriver::new(Counter, embed);
        let task = tokio::spawn(driver.run());

        let session = SessionId::new();
        let outbound = host.outbound();
        assert!(outbound.post(start(session)));
        assert!(outbound.post(message(session, 11)));

        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            loop {
                model_rx.changed().await.unwrap();
                if model_rx.borrow_and_update().total == 11 {
                    break;
                }
            }
        })
        .await
        .expect("model update not observed");

        drop(outbound);
        drop(host);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_drain_processes_queued_envelopes() {
        let (host, embed) = channel();
        let (mut driver, _rx) = EmbedDriver::new(Counter, embed);
        let session = SessionId::new();
        let outbound = host.outbound();
        assert!(outbound.post(start(session)));
        assert!(outbound.post(message(session, 5)));
        assert!(outbound.post(message(session, 6)));

        assert_eq!(driver.drain(), 3);
        assert_eq!(driver.model(), &CountModel { total: 11, events: 2 });
        assert_eq!(driver.drain(), 0);
    }

    #[tokio::test]
    async fn test_update_model_publishes_only_real_changes() {
        let (mut driver, _host, mut rx) = driver();
        let session = SessionId::new();
        driver.deliver(start(session));
        let _ = rx.borrow_and_update();

        driver.update_model(|model| model.total = 42);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().total, 42);

        // A no-op update publishes nothing.
        driver.update_model(|_| {});
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_watch_publishes_every_accepted_transition() {
        let (mut driver, _host, mut rx) = driver();
        let session = SessionId::new();
        driver.deliver(start(session));
        driver.deliver(message(session, 1));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().total, 1);
    }
}
