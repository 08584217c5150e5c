//! Angle-qualified EMA crossovers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Direction;

/// A crossover that passed the angle filter.
///
/// `price` is the close of the bar on which the flip happened. The EMA values
/// are carried along so persisted signal files can be written without
/// recomputing indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossEvent {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub direction: Direction,
    pub angle_degrees: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
}

impl CrossEvent {
    pub fn is_up(&self) -> bool {
        self.direction == Direction::Up
    }
}
