//! Bar and signal persistence.
//!
//! CSV codecs for the on-disk layout and the `BarProvider` seam the runner
//! loads bars through.

pub mod codec;
pub mod provider;

use std::path::PathBuf;

use thiserror::Error;

pub use codec::{
    append_trend_signals, format_datetime, parse_datetime, read_aggregate, read_bars,
    read_bars_file, read_signals, read_signals_file, read_trend_signals, signal_file_name,
    trend_signal_file_name, write_aggregate, write_bars, write_signals, write_signals_file,
    AggregateRow, TrendSignalRow, AGGREGATE_FILE, AGGREGATE_TODAY_FILE,
};
pub use provider::{BarProvider, CsvBarStore, MemoryBarProvider, Timeframe};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("unparseable timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("line {line}: column '{column}' is not a number: '{value}'")]
    InvalidNumber {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("unknown timeframe '{0}' (expected 1min, 5min or 30min)")]
    InvalidTimeframe(String),

    #[error("no data file for {symbol} under {}", .dir.display())]
    NoDataFile { symbol: String, dir: PathBuf },
}

impl DataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }
}
