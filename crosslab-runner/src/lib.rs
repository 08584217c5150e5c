//! CrossLab runner: backtest orchestration on top of `crosslab-core`.
//!
//! This crate provides:
//! - TOML configuration with validation
//! - Bar loading through a `BarProvider` with synthetic fallback
//! - Per-instrument pipeline: signals → simulation → report
//! - Parallel batch runs with isolated failures
//! - Signal scans writing per-instrument and aggregate signal files
//! - Trend and near-cross monitoring, with daily entry-signal files
//! - JSON and CSV export

pub mod batch;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod monitor;
pub mod runner;
pub mod scan;

pub use batch::{run_batch, run_symbols, BatchFailure, BatchSummary};
pub use config::{BacktestConfig, BacktestSection, ConfigError, SignalSource};
pub use data_loader::{load_series, LoadError, LoadOptions, LoadedBars};
pub use export::{load_batch, save_batch};
pub use monitor::{monitor_symbols, save_entry_signals, MonitorEntry, TimeframePair};
pub use runner::{run_from_data, run_instrument, InstrumentResult, RunError};
pub use scan::{scan_timeframe, ScanError, ScanOutcome};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<InstrumentResult>();
        assert_sync::<InstrumentResult>();
        assert_send::<BatchSummary>();
        assert_sync::<BatchSummary>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn error_types_are_send() {
        assert_send::<RunError>();
        assert_send::<ScanError>();
    }
}
