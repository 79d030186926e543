//! Capability objects — the only surface user code can reach.
//!
//! An implementation module adapts the restricted language's primitive
//! calls onto a plugin's domain-message vocabulary: given an outbound
//! sender, its factory returns a capability object whose named operations
//! validate caller arguments and forward at most one well-formed message
//! each. Capability objects are stateless wrappers; all state lives in
//! the plugin's model on the other side of the channel.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::channel::{DomainMessage, Envelope, Outbound, SessionId};
use crate::lang::Value;

/// Session-bound, counting sender handed to implementation factories.
///
/// Every send marshals one domain message into a control envelope tagged
/// with the owning execution's session and posts it across the boundary.
pub struct MessageSender<M> {
    outbound: Outbound,
    session: SessionId,
    sent: Arc<AtomicU32>,
    _marker: PhantomData<fn(M)>,
}

impl<M> Clone for MessageSender<M> {
    fn clone(&self) -> Self {
        Self {
            outbound: self.outbound.clone(),
            session: self.session,
            sent: Arc::clone(&self.sent),
            _marker: PhantomData,
        }
    }
}

impl<M: DomainMessage> MessageSender<M> {
    pub fn new(outbound: Outbound, session: SessionId) -> Self {
        Self {
            outbound,
            session,
            sent: Arc::new(AtomicU32::new(0)),
            _marker: PhantomData,
        }
    }

    /// Sends one domain message. Undeliverable messages (unattached embed)
    /// are dropped by the channel, which is the documented recovery path.
    pub fn send(&self, message: M) {
        let envelope = Envelope::Message {
            session: self.session,
            message,
        };
        match envelope.to_wire() {
            Ok(wire) => {
                if self.outbound.post(wire) {
                    self.sent.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => warn!(error = %e, "failed to marshal domain message"),
        }
    }

    /// Number of messages accepted for delivery so far.
    pub fn sent_count(&self) -> u32 {
        self.sent.load(Ordering::Relaxed)
    }
}

/// One named operation with a fixed arity.
///
/// The interpreter checks arity before invoking, so the callback may
/// index its argument slice freely. Operations never fail: arguments
/// with no valid mapping are a logged no-op.
pub struct Operation {
    arity: usize,
    run: Box<dyn Fn(&[Value]) + Send + Sync>,
}

impl Operation {
    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn invoke(&self, args: &[Value]) {
        (self.run)(args)
    }
}

/// The set of operations exposed to untrusted user source.
#[derive(Default)]
pub struct CapabilityObject {
    operations: HashMap<String, Operation>,
}

impl CapabilityObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an operation under its user-visible name.
    pub fn operation(
        mut self,
        name: &str,
        arity: usize,
        run: impl Fn(&[Value]) + Send + Sync + 'static,
    ) -> Self {
        self.operations.insert(
            name.to_string(),
            Operation {
                arity,
                run: Box::new(run),
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.operations.get(name)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Per-plugin, per-language adapter from primitive calls to messages.
///
/// The factory must resolve even if no operation is ever called, and
/// must not itself emit domain messages; only invoked operations may.
/// Unresolvable plugin/language combinations are rejected by the
/// registry before a factory is ever constructed.
#[async_trait]
pub trait ImplementationModule<M: DomainMessage>: Send + Sync {
    /// The language this module implements, e.g. `"basic"`.
    fn language_id(&self) -> &str;

    /// Builds the capability object bound to `sender`.
    async fn create(&self, sender: MessageSender<M>) -> CapabilityObject;
}
