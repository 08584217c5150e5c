use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::TradeRecord;

/// Capital after a realized trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapitalPoint {
    pub timestamp: NaiveDateTime,
    pub capital: f64,
}

/// Capital tracker.
///
/// Capital moves only when a trade closes; entries are free.
#[derive(Debug, Clone)]
pub struct CapitalTracker {
    initial_capital: f64,
    capital: f64,
    history: Vec<CapitalPoint>,
}

impl CapitalTracker {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            capital: initial_capital,
            history: Vec::new(),
        }
    }

    /// Book a closed trade at its exit time.
    pub fn apply_trade(&mut self, trade: &TradeRecord) {
        self.capital += trade.profit;
        self.history.push(CapitalPoint {
            timestamp: trade.exit_time,
            capital: self.capital,
        });
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn into_history(self) -> Vec<CapitalPoint> {
        self.history
    }
}
