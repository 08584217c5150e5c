//! Entry bar lookup and take-profit exit search.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, ExitReason, Position, PositionSide};

/// Where and why a position leaves the market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitFill {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub reason: ExitReason,
}

/// Index of the first bar strictly after `after`, `None` past the last bar.
pub fn next_bar_index(bars: &[Bar], after: NaiveDateTime) -> Option<usize> {
    let idx = bars.partition_point(|b| b.timestamp <= after);
    (idx < bars.len()).then_some(idx)
}

/// Scan bars after `entry_index` for the take-profit level.
///
/// Fills exactly at the target on the first bar whose high (long) or low
/// (short) reaches it. Without a hit the position is force-closed at the
/// last bar's close; when the entry bar is itself the last bar that is the
/// entry bar.
pub fn find_exit(
    bars: &[Bar],
    entry_index: usize,
    position: &Position,
    take_profit: f64,
) -> ExitFill {
    let target = position.take_profit_price(take_profit);

    let hit = bars
        .iter()
        .enumerate()
        .skip(entry_index + 1)
        .find(|(_, bar)| match position.side {
            PositionSide::Long => bar.high >= target,
            PositionSide::Short => bar.low <= target,
        });

    if let Some((i, bar)) = hit {
        return ExitFill {
            bar_index: i,
            timestamp: bar.timestamp,
            price: target,
            reason: ExitReason::TakeProfit,
        };
    }

    let last_index = bars.len().saturating_sub(1).max(entry_index);
    let last = &bars[last_index];
    ExitFill {
        bar_index: last_index,
        timestamp: last.timestamp,
        price: last.close,
        reason: ExitReason::EndOfData,
    }
}
