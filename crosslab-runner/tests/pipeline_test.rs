//! End-to-end: config → bar store → detection → simulation → export.

use std::fs;

use crosslab_core::data::{write_bars, CsvBarStore, Timeframe};
use crosslab_runner::data_loader::{generate_synthetic_minutes, resample};
use crosslab_runner::{load_batch, run_batch, save_batch, BacktestConfig, LoadOptions};

const CONFIG: &str = r#"
[backtest]
initial_capital = 100000.0
signal_timeframe = "30min"
exit_timeframe = "1min"
symbols = ["M2505", "RU2505"]

[indicators]
fast_period = 8
slow_period = 21
angle_threshold_deg = 0.0
"#;

#[test]
fn synthetic_batch_conserves_capital_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let config = BacktestConfig::from_toml(CONFIG).unwrap();
    let store = CsvBarStore::new(dir.path().join("data"));
    let opts = LoadOptions {
        synthetic: true,
        synthetic_minutes: 3 * 24 * 60,
        ..LoadOptions::default()
    };

    let summary = run_batch(&config, &store, &opts);
    assert!(summary.failures.is_empty(), "{:?}", summary.failures);
    assert_eq!(summary.results.len(), 2);
    assert!(summary.has_synthetic());

    for r in &summary.results {
        let realized: f64 = r.ledger.trades.iter().map(|t| t.profit).sum();
        assert!((r.report.final_capital - (100_000.0 + realized)).abs() < 1e-6);
        assert_eq!(r.report.trade_count, r.ledger.trades.len());
        assert_eq!(r.dataset_hash.len(), 64);
    }

    let out = dir.path().join("out");
    let written = save_batch(&summary, &out).unwrap();
    assert!(out.join("backtest_summary.csv").exists());
    assert!(out.join("backtest_M2505_trades.csv").exists());
    assert!(out.join("backtest_RU2505_trades.csv").exists());
    assert_eq!(written.len(), 4);

    let summary_csv = fs::read_to_string(out.join("backtest_summary.csv")).unwrap();
    assert_eq!(summary_csv.lines().count(), 3);
    assert!(summary_csv.lines().next().unwrap().starts_with("symbol,"));

    let loaded = load_batch(&out).unwrap();
    let symbols: Vec<_> = loaded.results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, ["M2505", "RU2505"]);
    assert_eq!(
        loaded.results[0].ledger.trades.len(),
        summary.results[0].ledger.trades.len()
    );
}

#[test]
fn bars_on_disk_give_same_result_as_synthetic() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    let opts = LoadOptions {
        synthetic: true,
        synthetic_minutes: 2 * 24 * 60,
        ..LoadOptions::default()
    };

    let minutes = generate_synthetic_minutes("M2505", opts.synthetic_start, opts.synthetic_minutes);
    for tf in [Timeframe::OneMinute, Timeframe::ThirtyMinutes] {
        let tf_dir = data.join(tf.as_str());
        fs::create_dir_all(&tf_dir).unwrap();
        let file = fs::File::create(tf_dir.join("M2505_20250105_000000.csv")).unwrap();
        write_bars(file, &resample(&minutes, tf)).unwrap();
    }

    let mut config = BacktestConfig::from_toml(CONFIG).unwrap();
    config.backtest.symbols = vec!["M2505".into()];

    let from_disk = run_batch(&config, &CsvBarStore::new(&data), &LoadOptions::default());
    let synthetic = run_batch(&config, &CsvBarStore::new(dir.path().join("empty")), &opts);

    let a = &from_disk.results[0];
    let b = &synthetic.results[0];
    assert!(!a.has_synthetic);
    assert!(b.has_synthetic);
    assert_eq!(a.ledger.trades, b.ledger.trades);
    assert_eq!(a.dataset_hash, b.dataset_hash);
}
