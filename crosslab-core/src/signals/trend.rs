//! Multi-timeframe trend state and the entry confirmation rule.
//!
//! The coarse timeframe sets the bias; a fresh flip on the fine timeframe in
//! the same direction confirms an entry.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Direction, PositionSide};
use crate::indicators::{IndicatorError, IndicatorFrame};

/// Latest value of something on both timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pair<T> {
    pub coarse: T,
    pub fine: T,
}

/// Trend snapshot for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendState {
    pub coarse_trend: Direction,
    pub fine_trend: Direction,
    /// The fine state at the last bar differs from the bar before it.
    pub fine_just_flipped: bool,
    pub latest_prices: Pair<f64>,
    pub latest_angles: Pair<Option<f64>>,
    pub as_of: Pair<NaiveDateTime>,
}

/// Confirmed directional entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntrySignal {
    pub side: PositionSide,
    /// Fine-timeframe close at the confirming bar.
    pub price: f64,
    pub timestamp: NaiveDateTime,
}

impl TrendState {
    /// LONG when both timeframes are up and the fine one just turned up,
    /// SHORT symmetrically, otherwise nothing.
    pub fn entry_signal(&self) -> Option<EntrySignal> {
        if !self.fine_just_flipped || self.coarse_trend != self.fine_trend {
            return None;
        }
        Some(EntrySignal {
            side: PositionSide::from(self.fine_trend),
            price: self.latest_prices.fine,
            timestamp: self.as_of.fine,
        })
    }
}

/// Index of the latest frame with both EMAs defined.
fn latest_defined(frames: &[IndicatorFrame]) -> Result<usize, IndicatorError> {
    frames
        .iter()
        .rposition(|f| f.state().is_some())
        .ok_or(IndicatorError::InsufficientHistory {
            required: 1,
            available: 0,
        })
}

/// Classify coarse and fine trends from their indicator frames.
pub fn classify_trend(
    coarse: &[IndicatorFrame],
    fine: &[IndicatorFrame],
) -> Result<TrendState, IndicatorError> {
    let ci = latest_defined(coarse)?;
    let fi = latest_defined(fine)?;
    let (c, f) = (&coarse[ci], &fine[fi]);

    let coarse_trend = c.state().ok_or(IndicatorError::InsufficientHistory {
        required: 1,
        available: 0,
    })?;
    let fine_trend = f.state().ok_or(IndicatorError::InsufficientHistory {
        required: 1,
        available: 0,
    })?;

    // A flip only counts at the very last bar of the series.
    let fine_just_flipped = fi + 1 == fine.len()
        && fi > 0
        && fine[fi - 1].state().is_some_and(|prev| prev != fine_trend);

    Ok(TrendState {
        coarse_trend,
        fine_trend,
        fine_just_flipped,
        latest_prices: Pair {
            coarse: c.close(),
            fine: f.close(),
        },
        latest_angles: Pair {
            coarse: c.angle_degrees,
            fine: f.angle_degrees,
        },
        as_of: Pair {
            coarse: c.timestamp(),
            fine: f.timestamp(),
        },
    })
}
