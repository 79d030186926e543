//! Explicit plugin registry.
//!
//! A plugin identifier maps to a statically known tuple: its state
//! machine factory plus the language implementations it supports. Lookup
//! of an unknown identifier is a defined [`LoadFailure`], not a dynamic
//! path construction; no evaluation is ever attempted for a combination
//! that does not resolve.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::capability::ImplementationModule;
use crate::channel::{channel, HostPort, Outbound};
use crate::error::{LoadFailure, RuntimeError};
use crate::host::{ExecutionHost, ExecutionReport};
use crate::machine::{EmbedDriver, StateMachine};

/// Message type of a plugin's state machine.
pub type MessageOf<P> = <<P as PluginSpec>::Machine as StateMachine>::Message;

/// Statically known definition of one plugin.
pub trait PluginSpec: Send + Sync + 'static {
    type Machine: StateMachine;

    /// The opaque identity renderers and programs address the plugin by.
    fn id() -> &'static str;

    /// Fresh state machine for a newly mounted embed.
    fn machine() -> Self::Machine;

    /// The language implementations this plugin supports.
    fn implementations() -> Vec<Arc<dyn ImplementationModule<MessageOf<Self>>>>;
}

/// A mounted plugin instance: the outer channel endpoint, an erased JSON
/// view of every published model snapshot, and the driver task.
///
/// Dropping the embed (together with any outbound clones) closes the
/// channel, which stops the driver and destroys the plugin model.
pub struct Embed {
    pub host: HostPort,
    pub model: watch::Receiver<serde_json::Value>,
    pub driver: JoinHandle<()>,
}

impl Embed {
    pub fn outbound(&self) -> Outbound {
        self.host.outbound()
    }
}

/// One registered plugin: identity plus its type-erased behavior.
pub struct PluginEntry {
    id: String,
    inner: Box<dyn ErasedPlugin>,
}

impl PluginEntry {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Supported language identifiers, in registration order.
    pub fn languages(&self) -> Vec<String> {
        self.inner.languages()
    }

    /// Mounts a fresh embed: channel pair, driver task, model stream.
    pub fn spawn_embed(&self) -> Embed {
        self.inner.spawn_embed()
    }

    /// Resolves the language implementation and executes `source`.
    pub async fn execute(
        &self,
        language: &str,
        source: &str,
        outbound: Outbound,
        step_budget: u32,
    ) -> Result<ExecutionReport, RuntimeError> {
        self.inner
            .execute(language, source, outbound, step_budget)
            .await
    }
}

/// Identifier → plugin definition mapping with defined not-found errors.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, PluginEntry>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin definition under its identity. A later
    /// registration with the same identity replaces the earlier one.
    pub fn register<P: PluginSpec>(&mut self) {
        let entry = PluginEntry {
            id: P::id().to_string(),
            inner: Box::new(TypedEntry::<P> {
                implementations: P::implementations(),
                _marker: std::marker::PhantomData,
            }),
        };
        debug!(plugin = P::id(), "registered plugin");
        self.plugins.insert(P::id().to_string(), entry);
    }

    /// Looks up a plugin by identity.
    pub fn resolve(&self, plugin: &str) -> Result<&PluginEntry, LoadFailure> {
        self.plugins.get(plugin).ok_or_else(|| LoadFailure::UnknownPlugin {
            plugin: plugin.to_string(),
        })
    }

    /// Registered identities in stable order.
    pub fn ids(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Object-safe face of a typed plugin definition.
trait ErasedPlugin: Send + Sync {
    fn languages(&self) -> Vec<String>;
    fn spawn_embed(&self) -> Embed;
    fn execute<'a>(
        &'a self,
        language: &'a str,
        source: &'a str,
        outbound: Outbound,
        step_budget: u32,
    ) -> BoxFuture<'a, Result<ExecutionReport, RuntimeError>>;
}

struct TypedEntry<P: PluginSpec> {
    implementations: Vec<Arc<dyn ImplementationModule<MessageOf<P>>>>,
    _marker: std::marker::PhantomData<fn(P)>,
}

impl<P: PluginSpec> ErasedPlugin for TypedEntry<P> {
    fn languages(&self) -> Vec<String> {
        self.implementations
            .iter()
            .map(|module| module.language_id().to_string())
            .collect()
    }

    fn spawn_embed(&self) -> Embed {
        let (host, embed_port) = channel();
        let (driver, mut model_rx) = EmbedDriver::new(P::machine(), embed_port);

        // Erased JSON mirror of the typed model stream, for observers
        // that do not know the plugin's concrete model type.
        let initial = serde_json::to_value(model_rx.borrow().clone())
            .unwrap_or(serde_json::Value::Null);
        let (json_tx, json_rx) = watch::channel(initial);
        let driver_task = tokio::spawn(driver.run());
        tokio::spawn(async move {
            while model_rx.changed().await.is_ok() {
                let snapshot = model_rx.borrow_and_update().clone();
                match serde_json::to_value(snapshot) {
                    Ok(value) => {
                        if json_tx.send(value).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to serialize model snapshot"),
                }
            }
        });

        Embed {
            host,
            model: json_rx,
            driver: driver_task,
        }
    }

    fn execute<'a>(
        &'a self,
        language: &'a str,
        source: &'a str,
        outbound: Outbound,
        step_budget: u32,
    ) -> BoxFuture<'a, Result<ExecutionReport, RuntimeError>> {
        Box::pin(async move {
            let module = self
                .implementations
                .iter()
                .find(|module| module.language_id() == language)
                .ok_or_else(|| LoadFailure::UnknownLanguage {
                    plugin: P::id().to_string(),
                    language: language.to_string(),
                })?;
            let host = ExecutionHost::new(P::id(), outbound, step_budget);
            Ok(host.execute(source, module.as_ref()).await?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityObject, MessageSender};
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Blip {
        level: u32,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize)]
    struct BlipModel {
        levels: Vec<u32>,
    }

    struct BlipMachine;

    impl StateMachine for BlipMachine {
        type Message = Blip;
        type Model = BlipModel;

        fn initial(&self) -> BlipModel {
            BlipModel::default()
        }

        fn reduce(&self, model: &mut BlipModel, message: Blip) {
            model.levels.push(message.level);
        }
    }

    struct BlipBasic;

    #[async_trait]
    impl ImplementationModule<Blip> for BlipBasic {
        fn language_id(&self) -> &str {
            "basic"
        }

        async fn create(&self, sender: MessageSender<Blip>) -> CapabilityObject {
            CapabilityObject::new().operation("blip", 1, move |args| {
                if let Some(level) = args[0].as_number() {
                    sender.send(Blip {
                        level: level.clamp(0.0, 9.0) as u32,
                    });
                }
            })
        }
    }

    struct BlipPlugin;

    impl PluginSpec for BlipPlugin {
        type Machine = BlipMachine;

        fn id() -> &'static str {
            "blip"
        }

        fn machine() -> BlipMachine {
            BlipMachine
        }

        fn implementations() -> Vec<Arc<dyn ImplementationModule<Blip>>> {
            vec![Arc::new(BlipBasic)]
        }
    }

    fn registry() -> PluginRegistry {
        let mut registry = PluginRegistry::new();
        registry.register::<BlipPlugin>();
        registry
    }

    #[test]
    fn test_resolve_unknown_plugin_is_a_load_failure() {
        let registry = registry();
        match registry.resolve("does-not-exist") {
            Err(LoadFailure::UnknownPlugin { plugin }) => {
                assert_eq!(plugin, "does-not-exist");
            }
            Err(other) => panic!("expected UnknownPlugin, got {other:?}"),
            Ok(_) => panic!("resolution unexpectedly succeeded"),
        }
    }

    #[test]
    fn test_resolve_lists_languages() {
        let registry = registry();
        let entry = registry.resolve("blip").unwrap();
        assert_eq!(entry.languages(), vec!["basic".to_string()]);
        assert_eq!(registry.ids(), vec!["blip"]);
    }

    #[tokio::test]
    async fn test_unknown_language_is_a_load_failure() {
        let registry = registry();
        let entry = registry.resolve("blip").unwrap();
        let embed = entry.spawn_embed();
        let result = entry.execute("forth", "blip(1)", embed.outbound(), 100).await;
        match result {
            Err(RuntimeError::Load(LoadFailure::UnknownLanguage { plugin, language })) => {
                assert_eq!(plugin, "blip");
                assert_eq!(language, "forth");
            }
            other => panic!("expected UnknownLanguage, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_full_pipeline_reaches_the_model_stream() {
        let registry = registry();
        let entry = registry.resolve("blip").unwrap();
        let mut embed = entry.spawn_embed();

        let report = entry
            .execute("basic", "blip(3); blip(99)", embed.outbound(), 100)
            .await
            .unwrap();
        assert_eq!(report.messages, 2);

        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                embed.model.changed().await.unwrap();
                let snapshot = embed.model.borrow_and_update().clone();
                if snapshot["levels"] == serde_json::json!([3, 9]) {
                    break;
                }
            }
        })
        .await
        .expect("model update not observed");
    }

    #[tokio::test]
    async fn test_second_execution_supersedes_the_first() {
        let registry = registry();
        let entry = registry.resolve("blip").unwrap();
        let mut embed = entry.spawn_embed();

        entry
            .execute("basic", "blip(1); blip(2); blip(3)", embed.outbound(), 100)
            .await
            .unwrap();
        entry
            .execute("basic", "blip(7)", embed.outbound(), 100)
            .await
            .unwrap();

        // The final state reflects only the second session.
        tokio::time::timeout(Duration::from_secs(1), async {
            loop {
                embed.model.changed().await.unwrap();
                let snapshot = embed.model.borrow_and_update().clone();
                if snapshot["levels"] == serde_json::json!([7]) {
                    break;
                }
            }
        })
        .await
        .expect("model update not observed");
    }
}
