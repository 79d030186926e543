//! Cross-boundary channel between the host context and an embed.
//!
//! Only serialized JSON values travel between the two sides; no shared
//! memory or object identity ever crosses. The host→embed lane carries
//! control envelopes ([`Envelope`]); the embed→host lane carries advisory
//! [`EmbedNotice`] values for the editing surface's diagnostics.
//!
//! Delivery is FIFO per sender. Messages sent while no embed driver is
//! attached are dropped, not buffered; a fresh `execute()` issued after
//! attachment establishes a valid session instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::error::ProtocolViolation;

/// Marker for plugin domain messages: inert serde data, nothing else.
pub trait DomainMessage: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> DomainMessage for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Identifies one `execute()` generation. Envelopes from a superseded
/// session are recognized by the embed driver and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The control envelope crossing the boundary, tagged with its session.
///
/// Wire shape is stable per plugin identity:
/// `{"type":"start","session":…}` resets the embed's model;
/// `{"type":"message","session":…,"message":{…}}` delivers one domain
/// update. Anything else arriving at the embed is a [`ProtocolViolation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Envelope<M> {
    Start { session: SessionId },
    Message { session: SessionId, message: M },
}

impl<M: Serialize> Envelope<M> {
    /// Marshals the envelope into the inert JSON form that crosses the
    /// boundary. Fails only if `M`'s `Serialize` impl does.
    pub fn to_wire(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// Advisory diagnostics flowing embed→host. Purely informational.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedNotice {
    /// A domain message tagged with a superseded (or never-started)
    /// session was dropped.
    Superseded { session: SessionId },
    /// An envelope failed to parse as any control shape.
    Violation(ProtocolViolation),
}

/// Creates a connected host/embed port pair.
pub fn channel() -> (HostPort, EmbedPort) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let attached = Arc::new(AtomicBool::new(false));

    let host = HostPort {
        outbound: Outbound {
            tx,
            attached: Arc::clone(&attached),
        },
        notices: notice_rx,
    };
    let embed = EmbedPort {
        rx,
        notices: notice_tx,
        attached,
    };
    (host, embed)
}

/// Cloneable outbound handle held by execution hosts and message senders.
///
/// This is the single shared mutable handle in the design: it is only
/// ever invoked, never read.
#[derive(Clone)]
pub struct Outbound {
    tx: mpsc::UnboundedSender<serde_json::Value>,
    attached: Arc<AtomicBool>,
}

impl Outbound {
    /// Posts one wire value toward the embed. Returns whether it was
    /// accepted for delivery; unattached or closed embeds drop the value.
    pub fn post(&self, value: serde_json::Value) -> bool {
        if !self.attached.load(Ordering::Acquire) {
            debug!("embed not attached, dropping outbound message");
            return false;
        }
        if self.tx.send(value).is_err() {
            debug!("embed receiver gone, dropping outbound message");
            return false;
        }
        true
    }
}

/// The outer endpoint, owned by the embedding side of the editor surface.
pub struct HostPort {
    outbound: Outbound,
    notices: mpsc::UnboundedReceiver<EmbedNotice>,
}

impl HostPort {
    /// Clones the invoke-only outbound handle.
    pub fn outbound(&self) -> Outbound {
        self.outbound.clone()
    }

    /// Receives the next advisory notice from the embed, or `None` once
    /// the embed side is gone.
    pub async fn recv_notice(&mut self) -> Option<EmbedNotice> {
        self.notices.recv().await
    }
}

/// The inner endpoint, owned by exactly one embed driver.
pub struct EmbedPort {
    rx: mpsc::UnboundedReceiver<serde_json::Value>,
    notices: mpsc::UnboundedSender<EmbedNotice>,
    attached: Arc<AtomicBool>,
}

impl EmbedPort {
    /// Marks the embed as reachable. Called by the driver at construction;
    /// values posted before this point are dropped, not buffered.
    pub fn attach(&self) {
        self.attached.store(true, Ordering::Release);
    }

    /// Receives the next inbound wire value in FIFO order.
    pub async fn recv(&mut self) -> Option<serde_json::Value> {
        self.rx.recv().await
    }

    /// Non-blocking variant used by synchronous delivery paths.
    pub fn try_recv(&mut self) -> Option<serde_json::Value> {
        self.rx.try_recv().ok()
    }

    /// Sends an advisory notice back to the host. Losing it is fine.
    pub fn notify(&self, notice: EmbedNotice) {
        let _ = self.notices.send(notice);
    }
}

impl Drop for EmbedPort {
    fn drop(&mut self) {
        self.attached.store(false, Ordering::Release);
    }
}
