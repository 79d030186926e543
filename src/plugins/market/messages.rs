//! Domain messages for the market plugin.

use serde::{Deserialize, Serialize};

/// Index of the supply curve in shift messages.
pub const SUPPLY_LINE: u32 = 0;
/// Index of the demand curve in shift messages.
pub const DEMAND_LINE: u32 = 1;

/// Updates to the supply/demand diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MarketMessage {
    /// Shifts one curve horizontally: positive amounts move it right,
    /// negative amounts left. `line_index` values other than the two
    /// known curves are ignored by the reducer.
    #[serde(rename_all = "camelCase")]
    Shift { line_index: u32, amount: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let wire = serde_json::to_value(MarketMessage::Shift {
            line_index: DEMAND_LINE,
            amount: -12.5,
        })
        .unwrap();
        assert_eq!(
            wire,
            json!({"type": "shift", "lineIndex": 1, "amount": -12.5})
        );
    }

    #[test]
    fn test_round_trip() {
        let message: MarketMessage =
            serde_json::from_value(json!({"type": "shift", "lineIndex": 0, "amount": 5.0}))
                .unwrap();
        assert_eq!(
            message,
            MarketMessage::Shift {
                line_index: SUPPLY_LINE,
                amount: 5.0,
            }
        );
    }
}
