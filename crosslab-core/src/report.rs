//! Performance summary of a simulation ledger.
//!
//! Pure functions over the ledger: capital curve and trade list in, scalars out.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TradeRecord;
use crate::engine::Ledger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("average profit is undefined for a run with no trades")]
    DivisionUndefined,
}

/// Summary statistics for one instrument's run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub symbol: String,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_profit: f64,
    /// Total profit as a percentage of initial capital.
    pub profit_pct: f64,
    pub trade_count: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// `None` when no trades closed.
    pub win_rate: Option<f64>,
    /// `None` when no trades closed.
    pub avg_profit_per_trade: Option<f64>,
    /// Largest peak-to-trough decline as a negative fraction.
    pub max_drawdown: f64,
    pub profit_factor: f64,
    pub skipped_signals: usize,
}

impl Report {
    /// Average profit per closed trade.
    pub fn average_profit(&self) -> Result<f64, ReportError> {
        self.avg_profit_per_trade
            .ok_or(ReportError::DivisionUndefined)
    }
}

/// Build the report for a ledger.
pub fn summarize(ledger: &Ledger) -> Report {
    let total_profit = ledger.final_capital - ledger.initial_capital;
    let trade_count = ledger.trades.len();
    let winning_trades = ledger.trades.iter().filter(|t| t.is_winner()).count();
    let losing_trades = ledger.trades.iter().filter(|t| t.profit < 0.0).count();

    let mut curve = Vec::with_capacity(ledger.capital_curve.len() + 1);
    curve.push(ledger.initial_capital);
    curve.extend(ledger.capital_curve.iter().map(|p| p.capital));

    Report {
        symbol: ledger.symbol.clone(),
        initial_capital: ledger.initial_capital,
        final_capital: ledger.final_capital,
        total_profit,
        profit_pct: total_profit / ledger.initial_capital * 100.0,
        trade_count,
        winning_trades,
        losing_trades,
        win_rate: win_rate(&ledger.trades),
        avg_profit_per_trade: (trade_count > 0).then(|| total_profit / trade_count as f64),
        max_drawdown: max_drawdown(&curve),
        profit_factor: profit_factor(&ledger.trades),
        skipped_signals: ledger.skipped.len(),
    }
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if capital never declines.
pub fn max_drawdown(capital_curve: &[f64]) -> f64 {
    let Some(&first) = capital_curve.first() else {
        return 0.0;
    };
    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &c in capital_curve {
        peak = peak.max(c);
        if peak > 0.0 {
            max_dd = max_dd.min((c - peak) / peak);
        }
    }
    max_dd
}

/// Fraction of trades with positive profit.
pub fn win_rate(trades: &[TradeRecord]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    Some(winners as f64 / trades.len() as f64)
}

/// Gross profits / gross losses, capped at 100.0.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades.iter().map(|t| t.profit.max(0.0)).sum();
    let gross_loss: f64 = trades.iter().map(|t| (-t.profit).max(0.0)).sum();
    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitReason, PositionSide};
    use crate::engine::CapitalPoint;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(9, minute, 0)
            .unwrap()
    }

    fn make_trade(profit: f64, minute: u32) -> TradeRecord {
        TradeRecord {
            symbol: "M2505".into(),
            side: PositionSide::Long,
            signal_time: at(minute),
            entry_time: at(minute),
            entry_price: 100.0,
            exit_time: at(minute + 1),
            exit_price: 100.0 + profit / 10.0,
            exit_reason: ExitReason::TakeProfit,
            size: 1.0,
            profit,
        }
    }

    fn ledger(profits: &[f64]) -> Ledger {
        let initial = 1_000.0;
        let trades: Vec<_> = profits
            .iter()
            .enumerate()
            .map(|(i, &p)| make_trade(p, i as u32 * 2))
            .collect();
        let mut capital = initial;
        let capital_curve = trades
            .iter()
            .map(|t| {
                capital += t.profit;
                CapitalPoint {
                    timestamp: t.exit_time,
                    capital,
                }
            })
            .collect();
        Ledger {
            symbol: "M2505".into(),
            initial_capital: initial,
            final_capital: capital,
            trades,
            skipped: Vec::new(),
            capital_curve,
        }
    }

    #[test]
    fn empty_ledger_has_undefined_average() {
        let report = summarize(&ledger(&[]));
        assert_eq!(report.trade_count, 0);
        assert_eq!(report.total_profit, 0.0);
        assert_eq!(report.profit_pct, 0.0);
        assert_eq!(report.win_rate, None);
        assert_eq!(report.avg_profit_per_trade, None);
        assert_eq!(report.average_profit(), Err(ReportError::DivisionUndefined));
        assert_eq!(report.max_drawdown, 0.0);
    }

    #[test]
    fn mixed_trades() {
        let report = summarize(&ledger(&[50.0, -100.0, 10.0]));
        assert_eq!(report.trade_count, 3);
        assert_eq!(report.winning_trades, 2);
        assert_eq!(report.losing_trades, 1);
        assert_eq!(report.total_profit, -40.0);
        assert!((report.profit_pct - (-4.0)).abs() < 1e-12);
        assert!((report.average_profit().unwrap() - (-40.0 / 3.0)).abs() < 1e-12);
        assert!((report.win_rate.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        // Peak 1050, trough 950.
        assert!((report.max_drawdown - (-100.0 / 1050.0)).abs() < 1e-12);
        assert!((report.profit_factor - 0.6).abs() < 1e-12);
    }

    #[test]
    fn drawdown_from_initial_capital() {
        assert!((max_drawdown(&[100.0, 90.0, 120.0]) - (-0.1)).abs() < 1e-12);
        assert_eq!(max_drawdown(&[100.0, 110.0, 120.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn profit_factor_all_winners_is_capped() {
        assert_eq!(profit_factor(&[make_trade(5.0, 0)]), 100.0);
        assert_eq!(profit_factor(&[]), 0.0);
    }
}
