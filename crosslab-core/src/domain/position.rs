use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::PositionSide;

/// An open position. Size is fixed at one contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    pub size: f64,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
}

impl Position {
    pub fn open(
        symbol: impl Into<String>,
        side: PositionSide,
        entry_price: f64,
        entry_time: NaiveDateTime,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            size: 1.0,
            entry_price,
            entry_time,
        }
    }

    /// Price at which the position is closed for a profit of `distance` price units.
    pub fn take_profit_price(&self, distance: f64) -> f64 {
        match self.side {
            PositionSide::Long => self.entry_price + distance,
            PositionSide::Short => self.entry_price - distance,
        }
    }

    /// Realized profit if closed at `exit_price`.
    pub fn profit_at(&self, exit_price: f64, multiplier: f64) -> f64 {
        let points = match self.side {
            PositionSide::Long => exit_price - self.entry_price,
            PositionSide::Short => self.entry_price - exit_price,
        };
        points * self.size * multiplier
    }
}
