//! JSON and CSV artifacts for batch runs.
//!
//! Files written by [`save_batch`] under the output directory:
//! - `backtest_summary.csv`: one row per instrument
//! - `backtest_{symbol}_trades.csv`: trade tape per instrument
//! - `backtest_results.json`: the full `BatchSummary`
//!
//! Persisted results carry a `schema_version`; unknown versions are
//! rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use crosslab_core::data::format_datetime;
use crosslab_core::domain::TradeRecord;
use tracing::info;

use crate::batch::BatchSummary;
use crate::runner::{InstrumentResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BatchSummary` to pretty JSON.
pub fn export_json(summary: &BatchSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize BatchSummary to JSON")
}

/// Deserialize a `BatchSummary` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BatchSummary> {
    let summary: BatchSummary =
        serde_json::from_str(json).context("failed to deserialize BatchSummary from JSON")?;
    if let Some(r) = summary
        .results
        .iter()
        .find(|r| r.schema_version > SCHEMA_VERSION)
    {
        bail!(
            "unsupported schema version {} for {} (max supported: {})",
            r.schema_version,
            r.symbol,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade tape as CSV.
///
/// Columns: symbol, side, signal_time, entry_time, entry_price, exit_time,
/// exit_price, exit_reason, size, profit
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "side",
        "signal_time",
        "entry_time",
        "entry_price",
        "exit_time",
        "exit_price",
        "exit_reason",
        "size",
        "profit",
    ])?;

    for t in trades {
        wtr.write_record([
            t.symbol.clone(),
            t.side.to_string(),
            format_datetime(t.signal_time),
            format_datetime(t.entry_time),
            t.entry_price.to_string(),
            format_datetime(t.exit_time),
            t.exit_price.to_string(),
            t.exit_reason.to_string(),
            t.size.to_string(),
            format!("{:.2}", t.profit),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the per-instrument summary table.
///
/// Columns: symbol, initial_capital, final_capital, total_profit, profit_pct,
/// trade_count, win_rate, avg_profit, max_drawdown, skipped_signals, synthetic
pub fn export_summary_csv(results: &[InstrumentResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "symbol",
        "initial_capital",
        "final_capital",
        "total_profit",
        "profit_pct",
        "trade_count",
        "win_rate",
        "avg_profit",
        "max_drawdown",
        "skipped_signals",
        "synthetic",
    ])?;

    let opt = |v: Option<f64>, precision: usize| {
        v.map(|x| format!("{x:.precision$}")).unwrap_or_default()
    };
    for r in results {
        let rep = &r.report;
        wtr.write_record([
            rep.symbol.clone(),
            format!("{:.2}", rep.initial_capital),
            format!("{:.2}", rep.final_capital),
            format!("{:.2}", rep.total_profit),
            format!("{:.4}", rep.profit_pct),
            rep.trade_count.to_string(),
            opt(rep.win_rate, 4),
            opt(rep.avg_profit_per_trade, 2),
            format!("{:.6}", rep.max_drawdown),
            rep.skipped_signals.to_string(),
            r.has_synthetic.to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write the batch artifacts into `output_dir`, returning the paths written.
pub fn save_batch(summary: &BatchSummary, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    let mut written = Vec::new();

    let path = output_dir.join("backtest_summary.csv");
    std::fs::write(&path, export_summary_csv(&summary.results)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    written.push(path);

    for r in &summary.results {
        let path = output_dir.join(format!("backtest_{}_trades.csv", r.symbol));
        std::fs::write(&path, export_trades_csv(&r.ledger.trades)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }

    let path = output_dir.join("backtest_results.json");
    std::fs::write(&path, export_json(summary)?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    written.push(path);

    info!(dir = %output_dir.display(), files = written.len(), "results saved");
    Ok(written)
}

/// Load a `BatchSummary` saved by [`save_batch`].
pub fn load_batch(output_dir: &Path) -> Result<BatchSummary> {
    let path = output_dir.join("backtest_results.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use crate::runner::run_from_data;
    use crosslab_core::domain::{Bar, ExitReason, InstrumentSpec, PositionSide};

    fn sample_trade() -> TradeRecord {
        let t0 = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        TradeRecord {
            symbol: "M2505".into(),
            side: PositionSide::Long,
            signal_time: t0,
            entry_time: t0 + Duration::minutes(1),
            entry_price: 3001.0,
            exit_time: t0 + Duration::minutes(7),
            exit_price: 3002.0,
            exit_reason: ExitReason::TakeProfit,
            size: 1.0,
            profit: 10.0,
        }
    }

    #[test]
    fn csv_trades_content() {
        let csv = export_trades_csv(&[sample_trade()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].split(',').count(), 10);
        assert_eq!(
            lines[1],
            "M2505,long,2025-01-02 09:30:00,2025-01-02 09:31:00,3001,2025-01-02 09:37:00,3002,take_profit,1,10.00"
        );
    }

    #[test]
    fn csv_empty_trades() {
        let csv = export_trades_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn json_rejects_future_schema() {
        let t0 = sample_trade().signal_time;
        let bars = vec![Bar::new(t0, 1.0, 1.0, 1.0, 1.0)];
        let mut result =
            run_from_data("M2505", &[], &bars, InstrumentSpec::new(1.0, 10.0), 1_000.0).unwrap();
        result.schema_version = SCHEMA_VERSION + 1;
        let summary = BatchSummary {
            results: vec![result],
            failures: Vec::new(),
        };
        let json = export_json(&summary).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }
}
