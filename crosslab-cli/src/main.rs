//! CrossLab CLI: signal scans, backtests and live trend snapshots.
//!
//! Commands:
//! - `scan`: detect crosses for every instrument and write signal files
//! - `backtest`: simulate the configured instruments and save result files
//! - `monitor`: coarse/fine trend, entry confirmation and potential crosses;
//!   `--save` appends confirmed entries to `trend_signals_{YYYYMMDD}.csv`
//! - `plan`: order intents for the latest signal of each flat instrument

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crosslab_core::data::{CsvBarStore, Timeframe};
use crosslab_core::orders::OrderPlanner;
use crosslab_runner::runner::read_signal_files;
use crosslab_runner::{
    monitor_symbols, run_batch, save_batch, save_entry_signals, scan_timeframe, BacktestConfig,
    BatchSummary, LoadOptions, TimeframePair,
};

#[derive(Parser)]
#[command(name = "crosslab", about = "CrossLab CLI: EMA crossover signals and backtests")]
struct Cli {
    /// TOML config file. Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect crosses and write per-instrument and aggregate signal files.
    Scan {
        /// Timeframes to scan. Defaults to all of 1min, 5min and 30min.
        #[arg(long = "timeframe")]
        timeframes: Vec<Timeframe>,

        /// Session date (YYYY-MM-DD) for the `_today` files. Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Run the backtest over the configured instruments.
    Backtest {
        /// Instruments to run. Defaults to the configured list.
        symbols: Vec<String>,

        /// Generate seeded synthetic bars where no bar file exists.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Output directory. Overrides `backtest.output_dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the current trend state of each instrument.
    Monitor {
        symbols: Vec<String>,

        #[arg(long, default_value = "30min")]
        coarse: Timeframe,

        #[arg(long, default_value = "5min")]
        fine: Timeframe,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Append confirmed entries to today's trend signal file.
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Plan entry orders from the latest signal files.
    Plan { symbols: Vec<String> },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Scan { timeframes, date } => run_scan(&config, timeframes, date.as_deref()),
        Commands::Backtest {
            symbols,
            synthetic,
            output_dir,
        } => run_backtest_cmd(config, symbols, synthetic, output_dir),
        Commands::Monitor {
            symbols,
            coarse,
            fine,
            json,
            save,
        } => run_monitor(&config, symbols, TimeframePair { coarse, fine }, json, save),
        Commands::Plan { symbols } => run_plan(&config, symbols),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<BacktestConfig> {
    match path {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(BacktestConfig::default()),
    }
}

fn symbols_or_configured(config: &BacktestConfig, symbols: Vec<String>) -> Vec<String> {
    if symbols.is_empty() {
        config.symbols()
    } else {
        symbols
    }
}

fn run_scan(config: &BacktestConfig, timeframes: Vec<Timeframe>, date: Option<&str>) -> Result<()> {
    let session_date = match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --date '{s}', expected YYYY-MM-DD"))?,
        None => chrono::Local::now().date_naive(),
    };
    let timeframes = if timeframes.is_empty() {
        Timeframe::ALL.to_vec()
    } else {
        timeframes
    };

    let store = CsvBarStore::new(&config.backtest.data_dir);
    for tf in timeframes {
        let outcome = scan_timeframe(
            &store,
            &config.indicators,
            tf,
            session_date,
            &config.backtest.signals_dir,
        )
        .with_context(|| format!("scan failed for {tf}"))?;

        println!(
            "{tf:<6} instruments: {:<4} signals: {:<5} today: {:<4} files: {}",
            outcome.instruments.len(),
            outcome.total_signals(),
            outcome.session_signals(),
            outcome.files_written.len()
        );
        for (symbol, error) in &outcome.failures {
            eprintln!("  skipped {symbol}: {error}");
        }
    }
    Ok(())
}

fn run_backtest_cmd(
    mut config: BacktestConfig,
    symbols: Vec<String>,
    synthetic: bool,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    if !symbols.is_empty() {
        config.backtest.symbols = symbols;
        config.validate()?;
    }
    let output_dir = output_dir.unwrap_or_else(|| config.backtest.output_dir.clone());
    let opts = LoadOptions {
        synthetic,
        ..LoadOptions::default()
    };

    let store = CsvBarStore::new(&config.backtest.data_dir);
    let summary = run_batch(&config, &store, &opts);

    print_summary(&summary);
    if summary.results.is_empty() {
        bail!("no instrument completed ({} failed)", summary.failures.len());
    }

    let written = save_batch(&summary, &output_dir)?;
    info!(files = written.len(), "backtest artifacts written");
    println!("Results saved to: {}", output_dir.display());
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("=== Backtest Summary ===");
    println!(
        "{:<8} {:>12} {:>10} {:>7} {:>8} {:>9} {:>8}",
        "Symbol", "Profit", "Profit %", "Trades", "Win %", "Max DD %", "Skipped"
    );
    println!("{}", "-".repeat(68));
    for r in &summary.results {
        let win_rate = r
            .report
            .win_rate
            .map(|w| format!("{:.1}", w * 100.0))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<8} {:>12.2} {:>10.2} {:>7} {:>8} {:>9.2} {:>8}",
            r.symbol,
            r.report.total_profit,
            r.report.profit_pct,
            r.report.trade_count,
            win_rate,
            r.report.max_drawdown * 100.0,
            r.report.skipped_signals
        );
    }
    println!("{}", "-".repeat(68));
    println!("Total profit: {:.2}", summary.total_profit());

    for failure in &summary.failures {
        println!("FAILED {}: {}", failure.symbol, failure.error);
    }
    if summary.has_synthetic() {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    println!();
}

fn run_monitor(
    config: &BacktestConfig,
    symbols: Vec<String>,
    timeframes: TimeframePair,
    json: bool,
    save: bool,
) -> Result<()> {
    let symbols = symbols_or_configured(config, symbols);
    let store = CsvBarStore::new(&config.backtest.data_dir);
    let entries = monitor_symbols(
        &store,
        &symbols,
        &config.indicators,
        &config.predictor,
        timeframes,
    );

    if save {
        let today = chrono::Local::now().date_naive();
        let saved = save_entry_signals(&entries, timeframes, &config.backtest.signals_dir, today)
            .context("failed to save entry signals")?;
        if let Some(path) = saved {
            eprintln!("Entry signals appended to {}", path.display());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!(
        "{:<8} {:>7} {:>7} {:>8}  {}",
        "Symbol",
        timeframes.coarse.as_str(),
        timeframes.fine.as_str(),
        "Entry",
        "Potential"
    );
    for entry in &entries {
        let Some(trend) = &entry.trend else {
            println!("{:<8} {}", entry.symbol, entry.error.as_deref().unwrap_or("no data"));
            continue;
        };
        let signal = entry
            .entry
            .map(|e| e.side.to_string())
            .unwrap_or_else(|| "-".into());
        let potential = entry
            .potential
            .map(|p| format!("{} ({}%)", p.direction, p.confidence))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<8} {:>7} {:>7} {:>8}  {}",
            entry.symbol, trend.coarse_trend, trend.fine_trend, signal, potential
        );
    }
    Ok(())
}

fn run_plan(config: &BacktestConfig, symbols: Vec<String>) -> Result<()> {
    let symbols = symbols_or_configured(config, symbols);
    let dir = config
        .backtest
        .signals_dir
        .join(config.backtest.signal_timeframe.as_str());
    let mut planner = OrderPlanner::new(config.instruments.clone());

    for symbol in &symbols {
        let events = read_signal_files(&dir, symbol)
            .with_context(|| format!("failed to read signals for {symbol}"))?;
        match planner.plan_entry(symbol, &events)? {
            Some(intent) => println!("{}", serde_json::to_string(&intent)?),
            None => warn!(%symbol, "no signal to act on"),
        }
    }
    Ok(())
}
