//! Live trend snapshots over in-memory bars.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use crosslab_core::data::{MemoryBarProvider, Timeframe};
use crosslab_core::domain::{Bar, Direction, PositionSide};
use crosslab_core::signals::{CrossParams, PredictParams};
use crosslab_core::data::read_trend_signals;
use crosslab_runner::{monitor_symbols, save_entry_signals, MonitorEntry, TimeframePair};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn make_bars(closes: &[f64], step_minutes: i64) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base() + Duration::minutes(step_minutes * i as i64),
                open,
                open.max(close) + 0.5,
                open.min(close) - 0.5,
                close,
            )
        })
        .collect()
}

/// Drift down for 40 bars, then rally 4/bar; the fast EMA crosses up at bar 41.
fn fine_closes_ending_on_flip() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..40).map(|i| 100.0 - 0.1 * i as f64).collect();
    let turn = closes[39];
    closes.extend((1..=2).map(|i| turn + 4.0 * i as f64));
    closes
}

#[test]
fn fresh_fine_flip_in_coarse_uptrend_confirms_long() {
    let coarse: Vec<f64> = (0..60).map(|i| 90.0 + i as f64).collect();
    let mut provider = MemoryBarProvider::new();
    provider.insert("M2505", Timeframe::ThirtyMinutes, make_bars(&coarse, 30));
    provider.insert("M2505", Timeframe::FiveMinutes, make_bars(&fine_closes_ending_on_flip(), 5));

    let symbols = vec!["M2505".to_string(), "RU2505".to_string()];
    let entries = monitor_symbols(
        &provider,
        &symbols,
        &CrossParams::default(),
        &PredictParams::default(),
        TimeframePair::default(),
    );

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].symbol, "M2505");
    let trend = entries[0].trend.unwrap();
    assert_eq!(trend.coarse_trend, Direction::Up);
    assert_eq!(trend.fine_trend, Direction::Up);
    assert!(trend.fine_just_flipped);
    let entry = entries[0].entry.unwrap();
    assert_eq!(entry.side, PositionSide::Long);
    assert_eq!(entry.timestamp, base() + Duration::minutes(5 * 41));
    assert!(entries[0].error.is_none());

    assert_eq!(entries[1].symbol, "RU2505");
    assert!(entries[1].trend.is_none());
    assert!(entries[1].error.as_deref().unwrap().contains("RU2505"));
}

fn confirmed_entries() -> Vec<MonitorEntry> {
    let coarse: Vec<f64> = (0..60).map(|i| 90.0 + i as f64).collect();
    let mut provider = MemoryBarProvider::new();
    provider.insert("M2505", Timeframe::ThirtyMinutes, make_bars(&coarse, 30));
    provider.insert("M2505", Timeframe::FiveMinutes, make_bars(&fine_closes_ending_on_flip(), 5));
    monitor_symbols(
        &provider,
        &["M2505".to_string(), "RU2505".to_string()],
        &CrossParams::default(),
        &PredictParams::default(),
        TimeframePair::default(),
    )
}

#[test]
fn entry_signals_append_to_the_daily_file() {
    let entries = confirmed_entries();
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("signals");
    let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();

    let first = save_entry_signals(&entries, TimeframePair::default(), &dir, date).unwrap();
    let second = save_entry_signals(&entries, TimeframePair::default(), &dir, date).unwrap();
    let path = first.unwrap();
    assert_eq!(second.as_ref(), Some(&path));
    assert!(path.ends_with("trend_signals_20250102.csv"));

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert_eq!(text.matches("symbol,datetime,type,price,reason").count(), 1);

    let rows = read_trend_signals(text.as_bytes()).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.symbol == "M2505" && r.kind == "LONG"));
    assert_eq!(rows[0].reason, "30min uptrend, 5min golden cross");
    assert_eq!(rows[0].datetime, "2025-01-02 12:25:00");
}

#[test]
fn no_confirmed_entry_writes_nothing() {
    let entries: Vec<MonitorEntry> = confirmed_entries()
        .into_iter()
        .filter(|e| e.entry.is_none())
        .collect();
    let tmp = tempfile::tempdir().unwrap();
    let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
    let saved = save_entry_signals(&entries, TimeframePair::default(), tmp.path(), date).unwrap();
    assert!(saved.is_none());
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}
