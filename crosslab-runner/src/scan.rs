//! Signal scan: detect crosses for every instrument with bar data and write
//! the signal files.
//!
//! Layout under `signals_root/{timeframe}/`:
//! - `{symbol}_golden_cross.csv`, `{symbol}_death_cross.csv` (only when non-empty)
//! - `{symbol}_golden_cross_today.csv`, `{symbol}_death_cross_today.csv`
//! - `all_signals.csv`, `all_signals_today.csv`, newest first
//!
//! A failing instrument is logged and skipped.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crosslab_core::data::{
    signal_file_name, write_aggregate, write_signals_file, AggregateRow, BarProvider, DataError,
    Timeframe, AGGREGATE_FILE, AGGREGATE_TODAY_FILE,
};
use crosslab_core::domain::{CrossEvent, Direction};
use crosslab_core::signals::{split_session, CrossDetector, CrossParams, SessionSplit};

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Signals found for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSignals {
    pub symbol: String,
    pub split: SessionSplit,
}

fn of_direction(events: &[CrossEvent], direction: Direction) -> Vec<CrossEvent> {
    events.iter().filter(|e| e.direction == direction).copied().collect()
}

/// Outcome of scanning one timeframe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub instruments: Vec<InstrumentSignals>,
    pub failures: Vec<(String, String)>,
    pub files_written: Vec<PathBuf>,
}

impl ScanOutcome {
    pub fn total_signals(&self) -> usize {
        self.instruments.iter().map(|i| i.split.historical.len()).sum()
    }

    pub fn session_signals(&self) -> usize {
        self.instruments.iter().map(|i| i.split.current_session.len()).sum()
    }
}

/// Detect crosses for every symbol at `timeframe` and split them by session.
pub fn detect_all(
    provider: &dyn BarProvider,
    params: &CrossParams,
    timeframe: Timeframe,
    session_date: NaiveDate,
) -> Result<ScanOutcome, ScanError> {
    let symbols = provider.symbols(timeframe)?;
    let detector = CrossDetector::new(*params);

    let detected: Vec<_> = symbols
        .par_iter()
        .map(|symbol| {
            let outcome = provider.bars(symbol, timeframe).map(|bars| {
                let events = detector.detect(&bars);
                split_session(&events, session_date)
            });
            (symbol, outcome)
        })
        .collect();

    let mut scan = ScanOutcome::default();
    for (symbol, outcome) in detected {
        match outcome {
            Ok(split) => scan.instruments.push(InstrumentSignals {
                symbol: symbol.clone(),
                split,
            }),
            Err(e) => {
                warn!(%symbol, %timeframe, error = %e, "scan failed");
                scan.failures.push((symbol.clone(), e.to_string()));
            }
        }
    }
    Ok(scan)
}

/// Detect and write all signal files for one timeframe.
pub fn scan_timeframe(
    provider: &dyn BarProvider,
    params: &CrossParams,
    timeframe: Timeframe,
    session_date: NaiveDate,
    signals_root: &Path,
) -> Result<ScanOutcome, ScanError> {
    let mut scan = detect_all(provider, params, timeframe, session_date)?;
    let dir = signals_root.join(timeframe.as_str());
    fs::create_dir_all(&dir).map_err(|source| ScanError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let mut files = Vec::new();
    let mut all_rows = Vec::new();
    let mut today_rows = Vec::new();
    for inst in &scan.instruments {
        for direction in [Direction::Up, Direction::Down] {
            let historical = of_direction(&inst.split.historical, direction);
            let today = of_direction(&inst.split.current_session, direction);
            for (events, is_today) in [(&historical, false), (&today, true)] {
                if events.is_empty() {
                    continue;
                }
                let path = dir.join(signal_file_name(&inst.symbol, direction, is_today));
                write_signals_file(&path, events)?;
                files.push(path);
            }
            all_rows.extend(historical.iter().map(|e| AggregateRow::new(&inst.symbol, e)));
            today_rows.extend(today.iter().map(|e| AggregateRow::new(&inst.symbol, e)));
        }
    }

    for (rows, name) in [(&all_rows, AGGREGATE_FILE), (&today_rows, AGGREGATE_TODAY_FILE)] {
        if rows.is_empty() {
            continue;
        }
        let path = dir.join(name);
        let file = File::create(&path).map_err(|e| DataError::Io {
            path: path.clone(),
            source: e,
        })?;
        write_aggregate(file, rows)?;
        files.push(path);
    }

    info!(
        %timeframe,
        instruments = scan.instruments.len(),
        signals = all_rows.len(),
        session_signals = today_rows.len(),
        failures = scan.failures.len(),
        "scan finished"
    );
    scan.files_written = files;
    Ok(scan)
}
