//! "basic" language implementation for the market plugin.

use async_trait::async_trait;
use tracing::debug;

use crate::capability::{CapabilityObject, ImplementationModule, MessageSender};
use crate::plugins::clamp;

use super::messages::{MarketMessage, DEMAND_LINE, SUPPLY_LINE};

/// Largest single shift the diagram accepts, in either direction.
const SHIFT_RANGE: (f64, f64) = (-40.0, 40.0);

/// Exposes `shift(line, amount)` with `line` one of `"supply"`,
/// `"demand"`.
pub struct BasicImplementation;

#[async_trait]
impl ImplementationModule<MarketMessage> for BasicImplementation {
    fn language_id(&self) -> &str {
        "basic"
    }

    async fn create(&self, sender: MessageSender<MarketMessage>) -> CapabilityObject {
        CapabilityObject::new().operation("shift", 2, move |args| {
            let Some(line) = args[0].as_text() else {
                debug!("shift: line must be a string, ignoring");
                return;
            };
            let line_index = match line {
                "supply" => SUPPLY_LINE,
                "demand" => DEMAND_LINE,
                other => {
                    debug!(line = other, "shift: unknown curve, ignoring");
                    return;
                }
            };
            let Some(amount) = args[1].as_number().and_then(|n| clamp(n, SHIFT_RANGE)) else {
                debug!("shift: malformed amount, ignoring");
                return;
            };
            sender.send(MarketMessage::Shift { line_index, amount });
        })
    }
}
