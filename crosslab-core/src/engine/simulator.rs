//! Event-driven trade simulator.
//!
//! For each cross event, in timestamp order:
//! 1. Settle any open position whose exit time has passed; skip if one is still open
//! 2. Enter at the close of the first bar strictly after the signal
//! 3. Search later bars for the take-profit level, else force-exit at the last bar
//! 4. Book the profit on exit
//!
//! The remaining position is settled after the last event, so every opened
//! position appears in the ledger.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::accounting::{CapitalPoint, CapitalTracker};
use super::exit_search::{find_exit, next_bar_index, ExitFill};
use crate::domain::{Bar, CrossEvent, Direction, InstrumentSpec, Position, TradeRecord};
use crate::signals::merge_events;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid simulation parameter: {0}")]
    InvalidParameter(String),
}

/// Why a signal did not open a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum SkipReason {
    /// A position was still open; it exits at `until`.
    PositionOpen { until: NaiveDateTime },
    /// No bar exists after the signal timestamp.
    NoFutureData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSignal {
    pub signal_time: NaiveDateTime,
    pub direction: Direction,
    pub reason: SkipReason,
}

/// Full simulation output for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub symbol: String,
    pub initial_capital: f64,
    pub final_capital: f64,
    /// Closed trades in exit order.
    pub trades: Vec<TradeRecord>,
    pub skipped: Vec<SkippedSignal>,
    pub capital_curve: Vec<CapitalPoint>,
}

impl Ledger {
    pub fn total_profit(&self) -> f64 {
        self.final_capital - self.initial_capital
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }
}

/// A position with its exit already determined.
#[derive(Debug, Clone)]
struct PendingTrade {
    signal_time: NaiveDateTime,
    position: Position,
    exit: ExitFill,
}

/// Mutable per-instrument simulation state.
pub struct SimulationContext<'a> {
    symbol: String,
    bars: &'a [Bar],
    spec: InstrumentSpec,
    capital: CapitalTracker,
    open: Option<PendingTrade>,
    trades: Vec<TradeRecord>,
    skipped: Vec<SkippedSignal>,
}

impl<'a> SimulationContext<'a> {
    pub fn new(
        symbol: impl Into<String>,
        bars: &'a [Bar],
        spec: InstrumentSpec,
        initial_capital: f64,
    ) -> Result<Self, SimError> {
        let symbol = symbol.into();
        validate_inputs(&symbol, bars, spec, initial_capital)?;
        Ok(Self {
            symbol,
            bars,
            spec,
            capital: CapitalTracker::new(initial_capital),
            open: None,
            trades: Vec::new(),
            skipped: Vec::new(),
        })
    }

    pub fn capital(&self) -> f64 {
        self.capital.capital()
    }

    pub fn has_open_position(&self) -> bool {
        self.open.is_some()
    }

    /// Process one event. Events must arrive in non-decreasing timestamp order.
    pub fn on_event(&mut self, event: &CrossEvent) {
        self.settle_until(event.timestamp);

        if let Some(pending) = &self.open {
            let until = pending.exit.timestamp;
            debug!(
                symbol = %self.symbol,
                signal_time = %event.timestamp,
                %until,
                "signal skipped: position open"
            );
            self.skip(event, SkipReason::PositionOpen { until });
            return;
        }

        match self.open_position(event) {
            Some(pending) => self.open = Some(pending),
            None => {
                debug!(
                    symbol = %self.symbol,
                    signal_time = %event.timestamp,
                    "signal skipped: no future bars"
                );
                self.skip(event, SkipReason::NoFutureData);
            }
        }
    }

    /// Settle the remaining position and produce the ledger.
    pub fn finish(mut self) -> Ledger {
        self.close_pending();
        Ledger {
            symbol: self.symbol,
            initial_capital: self.capital.initial_capital(),
            final_capital: self.capital.capital(),
            trades: self.trades,
            skipped: self.skipped,
            capital_curve: self.capital.into_history(),
        }
    }

    /// `None` when no bar follows the signal.
    fn open_position(&self, event: &CrossEvent) -> Option<PendingTrade> {
        let entry_index = next_bar_index(self.bars, event.timestamp)?;
        let entry_bar = &self.bars[entry_index];
        let position = Position::open(
            self.symbol.clone(),
            event.direction.into(),
            entry_bar.close,
            entry_bar.timestamp,
        );
        let exit = find_exit(self.bars, entry_index, &position, self.spec.take_profit);
        Some(PendingTrade {
            signal_time: event.timestamp,
            position,
            exit,
        })
    }

    fn settle_until(&mut self, now: NaiveDateTime) {
        let due = self
            .open
            .as_ref()
            .is_some_and(|pending| pending.exit.timestamp <= now);
        if due {
            self.close_pending();
        }
    }

    fn close_pending(&mut self) {
        let Some(pending) = self.open.take() else {
            return;
        };
        let PendingTrade {
            signal_time,
            position,
            exit,
        } = pending;
        let profit = position.profit_at(exit.price, self.spec.multiplier);
        let trade = TradeRecord {
            symbol: position.symbol,
            side: position.side,
            signal_time,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_time: exit.timestamp,
            exit_price: exit.price,
            exit_reason: exit.reason,
            size: position.size,
            profit,
        };
        self.capital.apply_trade(&trade);
        self.trades.push(trade);
    }

    fn skip(&mut self, event: &CrossEvent, reason: SkipReason) {
        self.skipped.push(SkippedSignal {
            signal_time: event.timestamp,
            direction: event.direction,
            reason,
        });
    }
}

fn validate_inputs(
    symbol: &str,
    bars: &[Bar],
    spec: InstrumentSpec,
    initial_capital: f64,
) -> Result<(), SimError> {
    if !(initial_capital.is_finite() && initial_capital > 0.0) {
        return Err(SimError::InvalidParameter(format!(
            "initial capital must be positive, got {initial_capital}"
        )));
    }
    spec.validate(symbol).map_err(|e| SimError::InvalidParameter(e.to_string()))?;
    if bars.windows(2).any(|w| w[0].timestamp >= w[1].timestamp) {
        return Err(SimError::InvalidParameter(format!(
            "bars for {symbol} are not strictly increasing in time"
        )));
    }
    Ok(())
}

/// Simulate one instrument's events against its exit-resolution bars.
///
/// Events are normalized with [`merge_events`] first, so callers may pass
/// them in any order. Bars must be strictly increasing in time.
pub fn simulate(
    symbol: &str,
    events: &[CrossEvent],
    bars: &[Bar],
    spec: InstrumentSpec,
    initial_capital: f64,
) -> Result<Ledger, SimError> {
    let mut ctx = SimulationContext::new(symbol, bars, spec, initial_capital)?;
    for event in merge_events([events.iter().copied()]) {
        ctx.on_event(&event);
    }
    let ledger = ctx.finish();
    debug!(
        symbol,
        trades = ledger.trades.len(),
        skipped = ledger.skipped.len(),
        final_capital = ledger.final_capital,
        "simulation finished"
    );
    Ok(ledger)
}
