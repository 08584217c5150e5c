//! Trend and near-cross snapshot per instrument.
//!
//! For each symbol: classify the coarse/fine trend pair, derive the entry
//! confirmation, and look for a cross that is about to happen on the fine
//! timeframe. Errors are captured per symbol.
//!
//! Confirmed entries can be appended to the daily `trend_signals_{YYYYMMDD}.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scan::ScanError;
use crosslab_core::data::{
    append_trend_signals, trend_signal_file_name, BarProvider, Timeframe, TrendSignalRow,
};
use crosslab_core::domain::PositionSide;
use crosslab_core::indicators::compute_frames;
use crosslab_core::signals::{
    classify_trend, predict_cross, CrossParams, EntrySignal, PotentialCross, PredictParams,
    TrendState,
};

/// Which resolutions play the coarse and fine roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeframePair {
    pub coarse: Timeframe,
    pub fine: Timeframe,
}

impl Default for TimeframePair {
    fn default() -> Self {
        Self {
            coarse: Timeframe::ThirtyMinutes,
            fine: Timeframe::FiveMinutes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorEntry {
    pub symbol: String,
    pub trend: Option<TrendState>,
    pub entry: Option<EntrySignal>,
    pub potential: Option<PotentialCross>,
    pub error: Option<String>,
}

/// Snapshot every symbol, in input order.
pub fn monitor_symbols(
    provider: &dyn BarProvider,
    symbols: &[String],
    params: &CrossParams,
    predict: &PredictParams,
    timeframes: TimeframePair,
) -> Vec<MonitorEntry> {
    symbols
        .par_iter()
        .map(|symbol| {
            snapshot(provider, symbol, params, predict, timeframes).unwrap_or_else(|e| {
                MonitorEntry {
                    symbol: symbol.clone(),
                    trend: None,
                    entry: None,
                    potential: None,
                    error: Some(e),
                }
            })
        })
        .collect()
}

/// Append every confirmed entry to `{dir}/trend_signals_{YYYYMMDD}.csv`.
///
/// Returns the file written, or `None` when no symbol confirmed an entry.
pub fn save_entry_signals(
    entries: &[MonitorEntry],
    timeframes: TimeframePair,
    dir: &Path,
    date: NaiveDate,
) -> Result<Option<PathBuf>, ScanError> {
    let rows: Vec<TrendSignalRow> = entries
        .iter()
        .filter_map(|m| {
            let entry = m.entry?;
            Some(TrendSignalRow::new(&m.symbol, &entry, entry_reason(entry.side, timeframes)))
        })
        .collect();
    if rows.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(dir).map_err(|source| ScanError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(trend_signal_file_name(date));
    append_trend_signals(&path, &rows)?;
    info!(path = %path.display(), count = rows.len(), "entry signals saved");
    Ok(Some(path))
}

/// `30min uptrend, 5min golden cross`
fn entry_reason(side: PositionSide, timeframes: TimeframePair) -> String {
    let (trend, cross) = match side {
        PositionSide::Long => ("uptrend", "golden cross"),
        PositionSide::Short => ("downtrend", "death cross"),
    };
    format!("{} {trend}, {} {cross}", timeframes.coarse, timeframes.fine)
}

fn snapshot(
    provider: &dyn BarProvider,
    symbol: &str,
    params: &CrossParams,
    predict: &PredictParams,
    timeframes: TimeframePair,
) -> Result<MonitorEntry, String> {
    let coarse_bars = provider
        .bars(symbol, timeframes.coarse)
        .map_err(|e| e.to_string())?;
    let fine_bars = provider
        .bars(symbol, timeframes.fine)
        .map_err(|e| e.to_string())?;
    let coarse = compute_frames(&coarse_bars, &params.indicators);
    let fine = compute_frames(&fine_bars, &params.indicators);

    let trend = classify_trend(&coarse, &fine).map_err(|e| e.to_string())?;
    Ok(MonitorEntry {
        symbol: symbol.to_string(),
        trend: Some(trend),
        entry: trend.entry_signal(),
        potential: predict_cross(&fine, predict),
        error: None,
    })
}
