//! Signal → order-intent planning.
//!
//! Turns the latest cross per instrument into limit order intents and, once
//! an entry fills, the matching take-profit close. Intents are plain data;
//! routing them to a broker is left to the caller.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{CrossEvent, InstrumentError, InstrumentTable, PositionSide, Symbol};

/// Whether an order opens or closes exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Offset {
    Open,
    Close,
}

/// A limit order to be routed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: Symbol,
    /// Side of the order itself (Long = buy, Short = sell).
    pub side: PositionSide,
    pub offset: Offset,
    pub limit_price: f64,
    pub volume: u32,
    /// Signal or fill that produced this intent.
    pub source_time: NaiveDateTime,
}

/// A reported execution of an entry intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryFill {
    pub symbol: Symbol,
    pub side: PositionSide,
    pub price: f64,
    pub volume: u32,
    pub timestamp: NaiveDateTime,
}

/// Tracks which instruments hold a position and plans intents accordingly.
#[derive(Debug, Clone)]
pub struct OrderPlanner {
    instruments: InstrumentTable,
    open: BTreeSet<Symbol>,
}

impl OrderPlanner {
    pub fn new(instruments: InstrumentTable) -> Self {
        Self {
            instruments,
            open: BTreeSet::new(),
        }
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.open.contains(symbol)
    }

    /// Plan an entry for the most recent cross, if the instrument is flat.
    ///
    /// The instrument counts as positioned as soon as the intent is issued.
    pub fn plan_entry(
        &mut self,
        symbol: &str,
        events: &[CrossEvent],
    ) -> Result<Option<OrderIntent>, InstrumentError> {
        self.instruments.get(symbol)?;
        if self.open.contains(symbol) {
            return Ok(None);
        }
        let Some(latest) = events.iter().max_by_key(|e| e.timestamp) else {
            return Ok(None);
        };
        self.open.insert(symbol.to_string());
        Ok(Some(OrderIntent {
            symbol: symbol.to_string(),
            side: latest.direction.into(),
            offset: Offset::Open,
            limit_price: latest.price,
            volume: 1,
            source_time: latest.timestamp,
        }))
    }

    /// Take-profit close for a filled entry.
    pub fn on_entry_fill(&self, fill: &EntryFill) -> Result<OrderIntent, InstrumentError> {
        let spec = self.instruments.get(&fill.symbol)?;
        let (side, limit_price) = match fill.side {
            PositionSide::Long => (PositionSide::Short, fill.price + spec.take_profit),
            PositionSide::Short => (PositionSide::Long, fill.price - spec.take_profit),
        };
        Ok(OrderIntent {
            symbol: fill.symbol.clone(),
            side,
            offset: Offset::Close,
            limit_price,
            volume: fill.volume,
            source_time: fill.timestamp,
        })
    }

    /// Mark an instrument flat again after its close fills.
    pub fn on_close_fill(&mut self, symbol: &str) {
        self.open.remove(symbol);
    }
}
