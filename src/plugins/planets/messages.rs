//! Domain messages for the planets plugin.

use serde::{Deserialize, Serialize};

/// One planet placed into the system.
///
/// `radius` is the orbital radius, `speed` the angular speed, `size` the
/// rendered diameter. All three arrive pre-clamped from the
/// implementation module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetMessage {
    pub color: String,
    pub name: String,
    pub radius: f64,
    pub speed: f64,
    pub size: f64,
}
