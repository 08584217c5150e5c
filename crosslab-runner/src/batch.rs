//! Multi-instrument batch runs.
//!
//! Instruments are independent: each runs its own pipeline on a rayon worker
//! and a failure in one never stops its siblings. Results keep input order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crosslab_core::data::BarProvider;

use crate::config::BacktestConfig;
use crate::data_loader::LoadOptions;
use crate::runner::{run_instrument, InstrumentResult};

/// An instrument whose pipeline returned an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub symbol: String,
    pub error: String,
}

/// Outcome of a batch: successes and failures, each in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub results: Vec<InstrumentResult>,
    pub failures: Vec<BatchFailure>,
}

impl BatchSummary {
    pub fn result(&self, symbol: &str) -> Option<&InstrumentResult> {
        self.results.iter().find(|r| r.symbol == symbol)
    }

    pub fn total_profit(&self) -> f64 {
        self.results.iter().map(|r| r.report.total_profit).sum()
    }

    pub fn has_synthetic(&self) -> bool {
        self.results.iter().any(|r| r.has_synthetic)
    }
}

/// Run every symbol in `config.symbols()`.
pub fn run_batch(
    config: &BacktestConfig,
    provider: &dyn BarProvider,
    opts: &LoadOptions,
) -> BatchSummary {
    run_symbols(config, provider, &config.symbols(), opts)
}

/// Run the given symbols in parallel.
pub fn run_symbols(
    config: &BacktestConfig,
    provider: &dyn BarProvider,
    symbols: &[String],
    opts: &LoadOptions,
) -> BatchSummary {
    let outcomes: Vec<_> = symbols
        .par_iter()
        .map(|symbol| (symbol, run_instrument(config, provider, symbol, opts)))
        .collect();

    let mut summary = BatchSummary::default();
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(result) => summary.results.push(result),
            Err(e) => {
                warn!(%symbol, error = %e, "instrument failed");
                summary.failures.push(BatchFailure {
                    symbol: symbol.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    summary
}
