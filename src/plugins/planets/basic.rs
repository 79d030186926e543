//! "basic" language implementation for the planets plugin.

use async_trait::async_trait;
use tracing::debug;

use crate::capability::{CapabilityObject, ImplementationModule, MessageSender};
use crate::plugins::clamp;

use super::messages::PlanetMessage;

/// Orbital radius range the view can lay out.
const RADIUS_RANGE: (f64, f64) = (10.0, 500.0);
/// Angular speed range.
const SPEED_RANGE: (f64, f64) = (0.0, 100.0);
/// Rendered diameter range.
const SIZE_RANGE: (f64, f64) = (4.0, 200.0);

/// Exposes `createPlanet(color, name, radius, speed, size)`.
pub struct BasicImplementation;

#[async_trait]
impl ImplementationModule<PlanetMessage> for BasicImplementation {
    fn language_id(&self) -> &str {
        "basic"
    }

    async fn create(&self, sender: MessageSender<PlanetMessage>) -> CapabilityObject {
        CapabilityObject::new().operation("createPlanet", 5, move |args| {
            let (Some(color), Some(name)) = (args[0].as_text(), args[1].as_text()) else {
                debug!("createPlanet: color and name must be strings, ignoring");
                return;
            };
            let color = color.trim();
            let name = name.trim();
            if color.is_empty() || name.is_empty() {
                debug!("createPlanet: empty color or name, ignoring");
                return;
            }
            let (Some(radius), Some(speed), Some(size)) = (
                args[2].as_number().and_then(|n| clamp(n, RADIUS_RANGE)),
                args[3].as_number().and_then(|n| clamp(n, SPEED_RANGE)),
                args[4].as_number().and_then(|n| clamp(n, SIZE_RANGE)),
            ) else {
                debug!("createPlanet: malformed numeric argument, ignoring");
                return;
            };
            sender.send(PlanetMessage {
                color: color.to_string(),
                name: name.to_string(),
                radius,
                speed,
                size,
            });
        })
    }
}
