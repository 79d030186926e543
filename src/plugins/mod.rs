//! Built-in plugins.
//!
//! Each plugin is a self-contained triple: its domain messages
//! (`messages`), its reducer state machine and model (`state`), and one
//! implementation module per supported language (`basic`). The `mod.rs`
//! ties them together as a [`PluginSpec`] the registry can mount.

pub mod market;
pub mod music;
pub mod planets;
pub mod sound_waves;

use crate::config::Config;
use crate::registry::{PluginRegistry, PluginSpec};

/// Builds the registry of built-in plugins, honoring the config's
/// `[plugins] enabled` filter (empty list registers everything).
pub fn builtin_registry(config: &Config) -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    if config.is_enabled(market::Market::id()) {
        registry.register::<market::Market>();
    }
    if config.is_enabled(music::Music::id()) {
        registry.register::<music::Music>();
    }
    if config.is_enabled(planets::Planets::id()) {
        registry.register::<planets::Planets>();
    }
    if config.is_enabled(sound_waves::SoundWaves::id()) {
        registry.register::<sound_waves::SoundWaves>();
    }
    registry
}

/// Rounds and clamps a user-supplied number into an inclusive integer
/// range. Non-finite input maps to `None` so callers can no-op.
pub(crate) fn clamp_round(n: f64, min: u32, max: u32) -> Option<u32> {
    if !n.is_finite() {
        return None;
    }
    let rounded = n.round().clamp(min as f64, max as f64);
    Some(rounded as u32)
}

/// Clamps a user-supplied number into an inclusive range. Non-finite
/// input maps to `None` so callers can no-op.
pub(crate) fn clamp(n: f64, (min, max): (f64, f64)) -> Option<f64> {
    if !n.is_finite() {
        return None;
    }
    Some(n.clamp(min, max))
}
