//! Per-instrument backtest pipeline.
//!
//! Two entry points:
//! - `run_instrument()`: loads bars and signals through a provider, then runs.
//!   Used by the batch runner.
//! - `run_from_data()`: takes events and exit bars directly. No I/O.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crosslab_core::data::{read_signals_file, signal_file_name, BarProvider, DataError};
use crosslab_core::domain::{Bar, CrossEvent, Direction, InstrumentError, InstrumentSpec};
use crosslab_core::engine::{simulate, Ledger, SimError};
use crosslab_core::report::{summarize, Report};
use crosslab_core::signals::{merge_events, CrossDetector};

use crate::config::{BacktestConfig, ConfigError, SignalSource};
use crate::data_loader::{load_series, require_bars, LoadError, LoadOptions};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimError),
}

/// Current schema version for persisted results.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Complete result of one instrument's run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub report: Report,
    pub ledger: Ledger,
    pub signal_count: usize,
    pub exit_bar_count: usize,
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

/// Simulate pre-loaded events against pre-loaded exit bars. No I/O.
pub fn run_from_data(
    symbol: &str,
    events: &[CrossEvent],
    exit_bars: &[Bar],
    spec: InstrumentSpec,
    initial_capital: f64,
) -> Result<InstrumentResult, RunError> {
    let ledger = simulate(symbol, events, exit_bars, spec, initial_capital)?;
    let report = summarize(&ledger);
    Ok(InstrumentResult {
        schema_version: SCHEMA_VERSION,
        symbol: symbol.to_string(),
        report,
        ledger,
        signal_count: events.len(),
        exit_bar_count: exit_bars.len(),
        dataset_hash: String::new(),
        has_synthetic: false,
    })
}

/// Run one instrument end to end per `config`.
pub fn run_instrument(
    config: &BacktestConfig,
    provider: &dyn BarProvider,
    symbol: &str,
    opts: &LoadOptions,
) -> Result<InstrumentResult, RunError> {
    let spec = config.instruments.get(symbol)?;
    let bt = &config.backtest;

    let (events, signal_hash, signal_synthetic) = match bt.signal_source {
        SignalSource::Detect => {
            let loaded = load_series(provider, symbol, bt.signal_timeframe, opts)?;
            require_bars(&loaded, config.indicators.indicators.warmup_bars())?;
            let events = CrossDetector::new(config.indicators).detect(&loaded.bars);
            (events, loaded.dataset_hash, loaded.has_synthetic)
        }
        SignalSource::Files => {
            let dir = bt.signals_dir.join(bt.signal_timeframe.as_str());
            (read_signal_files(&dir, symbol)?, String::new(), false)
        }
    };
    debug!(%symbol, signals = events.len(), "signals ready");

    let exits = load_series(provider, symbol, bt.exit_timeframe, opts)?;
    let mut result = run_from_data(symbol, &events, &exits.bars, spec, bt.initial_capital)?;

    let mut hasher = blake3::Hasher::new();
    hasher.update(signal_hash.as_bytes());
    hasher.update(exits.dataset_hash.as_bytes());
    result.dataset_hash = hasher.finalize().to_hex().to_string();
    result.has_synthetic = signal_synthetic || exits.has_synthetic;

    info!(
        %symbol,
        trades = result.report.trade_count,
        profit = result.report.total_profit,
        profit_pct = result.report.profit_pct,
        "instrument finished"
    );
    Ok(result)
}

/// Read and merge an instrument's golden and death cross files.
///
/// A missing file means no signals of that direction.
pub fn read_signal_files(dir: &Path, symbol: &str) -> Result<Vec<CrossEvent>, DataError> {
    let mut streams = Vec::with_capacity(2);
    for direction in [Direction::Up, Direction::Down] {
        let path = dir.join(signal_file_name(symbol, direction, false));
        if !path.exists() {
            debug!(path = %path.display(), "no signal file");
            continue;
        }
        streams.push(read_signals_file(&path, direction)?);
    }
    Ok(merge_events(streams))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use crosslab_core::data::{write_signals_file, MemoryBarProvider};
    use crosslab_core::domain::ExitReason;

    fn t(i: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            + Duration::minutes(i)
    }

    fn event(i: i64, direction: Direction) -> CrossEvent {
        CrossEvent {
            timestamp: t(i),
            price: 100.0,
            direction,
            angle_degrees: 25.0 * f64::from(direction.sign()),
            ema_fast: 100.0,
            ema_slow: 100.0,
        }
    }

    #[test]
    fn run_from_data_builds_report() {
        let bars: Vec<Bar> = (0..5)
            .map(|i| Bar::new(t(i), 100.0, 100.0 + i as f64, 99.5, 100.0 + i as f64 * 0.5))
            .collect();
        let result = run_from_data(
            "M2505",
            &[event(0, Direction::Up)],
            &bars,
            InstrumentSpec::new(1.0, 10.0),
            100_000.0,
        )
        .unwrap();
        // Entry at t1 close 100.5; t2 high 102 reaches 101.5.
        assert_eq!(result.ledger.trades[0].exit_reason, ExitReason::TakeProfit);
        assert_eq!(result.report.trade_count, 1);
        assert_eq!(result.signal_count, 1);
        assert_eq!(result.exit_bar_count, 5);
    }

    #[test]
    fn unknown_instrument_fails_fast() {
        let config = BacktestConfig::default();
        let provider = MemoryBarProvider::new();
        let err =
            run_instrument(&config, &provider, "ZZ9999", &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, RunError::Instrument(InstrumentError::UnknownInstrument { .. })));
    }

    #[test]
    fn signal_files_merge_with_first_wins() {
        let dir = tempfile::tempdir().unwrap();
        write_signals_file(
            &dir.path().join("M2505_golden_cross.csv"),
            &[event(3, Direction::Up), event(9, Direction::Up)],
        )
        .unwrap();
        write_signals_file(
            &dir.path().join("M2505_death_cross.csv"),
            &[event(5, Direction::Down), event(9, Direction::Down)],
        )
        .unwrap();

        let events = read_signal_files(dir.path(), "M2505").unwrap();
        let dirs: Vec<_> = events.iter().map(|e| e.direction).collect();
        assert_eq!(dirs, [Direction::Up, Direction::Down, Direction::Up]);
    }

    #[test]
    fn missing_signal_files_mean_no_events() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_signal_files(dir.path(), "RU2505").unwrap().is_empty());
    }
}
