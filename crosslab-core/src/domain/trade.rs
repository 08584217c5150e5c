//! Completed round-trip trades.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::PositionSide;

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// A bar reached the take-profit level; filled exactly at that level.
    TakeProfit,
    /// No bar reached the target; closed at the last bar's close.
    EndOfData,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TakeProfit => write!(f, "take_profit"),
            ExitReason::EndOfData => write!(f, "end_of_data"),
        }
    }
}

/// A complete round-trip trade record: entry → exit.
///
/// One row per round trip. Entry and exit legs are not stored separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub symbol: String,
    pub side: PositionSide,

    // ── Signal ──
    pub signal_time: NaiveDateTime,

    // ── Entry ──
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Size / PnL ──
    pub size: f64,
    pub profit: f64,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }

    /// Price points captured, sign-adjusted for the side.
    pub fn points(&self) -> f64 {
        match self.side {
            PositionSide::Long => self.exit_price - self.entry_price,
            PositionSide::Short => self.entry_price - self.exit_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample_trade() -> TradeRecord {
        TradeRecord {
            symbol: "RU2505".into(),
            side: PositionSide::Short,
            signal_time: at(9, 30),
            entry_time: at(9, 31),
            entry_price: 17_500.0,
            exit_time: at(10, 2),
            exit_price: 17_495.0,
            exit_reason: ExitReason::TakeProfit,
            size: 1.0,
            profit: 50.0,
        }
    }

    #[test]
    fn short_points_positive_when_price_falls() {
        let trade = sample_trade();
        assert_eq!(trade.points(), 5.0);
        assert!(trade.is_winner());
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: TradeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
        assert!(json.contains("\"take_profit\""));
    }
}
