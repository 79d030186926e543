use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub runtime: RuntimeConfig,
    pub plugins: PluginsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Maximum interpreted statements/iterations per execution.
    /// `0` disables the budget entirely.
    pub step_budget: u32,
    /// How long the one-shot CLI waits for in-flight envelopes to reach
    /// the embed before taking the final model snapshot.
    pub settle_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            step_budget: default_step_budget(),
            settle_ms: default_settle_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct PluginsConfig {
    /// Plugin identities to register. Empty means all built-ins.
    pub enabled: Vec<String>,
}

fn default_step_budget() -> u32 {
    10_000
}

fn default_settle_ms() -> u64 {
    50
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // Expand environment variables like ${SIMBOX_STEP_BUDGET}
        let expanded = shellexpand::env(&content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to defaults.
    /// Used for the well-known default location so a fresh checkout runs
    /// without any config file.
    pub fn load_or_default(path: &str) -> anyhow::Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::load(path)
        } else {
            debug!(path, "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Checks whether a plugin identity should be registered.
    pub fn is_enabled(&self, plugin: &str) -> bool {
        self.plugins.enabled.is_empty() || self.plugins.enabled.iter().any(|p| p == plugin)
    }
}
