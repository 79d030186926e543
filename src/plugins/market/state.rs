//! Model and state machine for the market plugin.
//!
//! The diagram holds two linear curves over quantity q ∈ [0, 200]:
//! demand p = 100 − q and supply p = q, each offset horizontally by its
//! cumulative shift. The equilibrium is their intersection. The math is
//! illustrative; the contractual part is the message shape and the
//! reducer's behavior.

use serde::Serialize;
use tracing::debug;

use crate::machine::StateMachine;

use super::messages::{MarketMessage, DEMAND_LINE, SUPPLY_LINE};

/// Rightmost quantity the diagram renders.
const QUANTITY_RANGE: f64 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A renderable curve segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Line {
    pub start: Point,
    pub end: Point,
}

/// Cumulative shifts plus the derived equilibrium.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketModel {
    pub supply_shift: f64,
    pub demand_shift: f64,
    pub price: f64,
    pub quantity: f64,
}

impl Default for MarketModel {
    fn default() -> Self {
        let mut model = Self {
            supply_shift: 0.0,
            demand_shift: 0.0,
            price: 0.0,
            quantity: 0.0,
        };
        model.recompute();
        model
    }
}

impl MarketModel {
    /// Intersection of `100 − (q − d)` and `q − s`.
    fn recompute(&mut self) {
        self.quantity = 50.0 + (self.demand_shift + self.supply_shift) / 2.0;
        self.price = self.quantity - self.supply_shift;
    }

    /// The shifted supply curve as a renderable segment.
    pub fn supply_line(&self) -> Line {
        Line {
            start: Point {
                x: 0.0,
                y: -self.supply_shift,
            },
            end: Point {
                x: QUANTITY_RANGE,
                y: QUANTITY_RANGE - self.supply_shift,
            },
        }
    }

    /// The shifted demand curve as a renderable segment.
    pub fn demand_line(&self) -> Line {
        Line {
            start: Point {
                x: 0.0,
                y: 100.0 + self.demand_shift,
            },
            end: Point {
                x: QUANTITY_RANGE,
                y: 100.0 + self.demand_shift - QUANTITY_RANGE,
            },
        }
    }

    pub fn equilibrium(&self) -> Point {
        Point {
            x: self.quantity,
            y: self.price,
        }
    }
}

/// Accumulates curve shifts and keeps the equilibrium current.
pub struct MarketMachine;

impl StateMachine for MarketMachine {
    type Message = MarketMessage;
    type Model = MarketModel;

    fn initial(&self) -> MarketModel {
        MarketModel::default()
    }

    fn reduce(&self, model: &mut MarketModel, message: MarketMessage) {
        match message {
            MarketMessage::Shift { line_index, amount } => {
                match line_index {
                    SUPPLY_LINE => model.supply_shift += amount,
                    DEMAND_LINE => model.demand_shift += amount,
                    other => {
                        debug!(line_index = other, "shift for unknown curve, ignoring");
                        return;
                    }
                }
                model.recompute();
            }
        }
    }
}
