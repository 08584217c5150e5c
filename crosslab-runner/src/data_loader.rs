//! Bar loading for the runner.
//!
//! Loads one instrument's series through a [`BarProvider`] and implements the
//! fallback policy:
//! 1. If the provider has the series → use it
//! 2. If it has no data file and `synthetic` is set → generate synthetic bars (tagged)
//! 3. Otherwise → fail with a clear error
//!
//! Synthetic data is a developer-only demo mode. Every timeframe is resampled
//! from the same seeded minute path, so signal and exit series agree.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::warn;

use crosslab_core::data::{BarProvider, DataError, Timeframe};
use crosslab_core::domain::Bar;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no {timeframe} bars for '{symbol}' (enable synthetic data for a demo run)")]
    NoData { symbol: String, timeframe: Timeframe },

    #[error("'{symbol}' has {count} {timeframe} bars, need at least {required}")]
    TooFewBars {
        symbol: String,
        timeframe: Timeframe,
        count: usize,
        required: usize,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Generate synthetic bars when the provider has no data for a symbol.
    pub synthetic: bool,
    /// First synthetic minute.
    pub synthetic_start: NaiveDateTime,
    /// Length of the synthetic minute path.
    pub synthetic_minutes: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            synthetic: false,
            synthetic_start: NaiveDate::from_ymd_opt(2025, 1, 2)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap_or_default(),
            synthetic_minutes: 5 * 24 * 60,
        }
    }
}

/// One loaded series with provenance.
#[derive(Debug, Clone)]
pub struct LoadedBars {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub bars: Vec<Bar>,
    /// Provider name, or "synthetic".
    pub source: String,
    pub has_synthetic: bool,
    /// BLAKE3 over symbol, timeframe and every bar.
    pub dataset_hash: String,
}

/// Load one series, falling back to synthetic bars when allowed.
pub fn load_series(
    provider: &dyn BarProvider,
    symbol: &str,
    timeframe: Timeframe,
    opts: &LoadOptions,
) -> Result<LoadedBars, LoadError> {
    let (bars, source, has_synthetic) = match provider.bars(symbol, timeframe) {
        Ok(bars) => (bars, provider.name().to_string(), false),
        Err(DataError::NoDataFile { .. }) if opts.synthetic => {
            warn!(
                %symbol,
                %timeframe,
                "generating synthetic bars; results will be tagged as synthetic"
            );
            let minutes =
                generate_synthetic_minutes(symbol, opts.synthetic_start, opts.synthetic_minutes);
            (resample(&minutes, timeframe), "synthetic".to_string(), true)
        }
        Err(DataError::NoDataFile { .. }) => {
            return Err(LoadError::NoData {
                symbol: symbol.to_string(),
                timeframe,
            })
        }
        Err(e) => return Err(e.into()),
    };

    let dataset_hash = compute_dataset_hash(symbol, timeframe, &bars);
    Ok(LoadedBars {
        symbol: symbol.to_string(),
        timeframe,
        bars,
        source,
        has_synthetic,
        dataset_hash,
    })
}

/// Require at least `required` bars in a loaded series.
pub fn require_bars(loaded: &LoadedBars, required: usize) -> Result<(), LoadError> {
    if loaded.bars.len() < required {
        return Err(LoadError::TooFewBars {
            symbol: loaded.symbol.clone(),
            timeframe: loaded.timeframe,
            count: loaded.bars.len(),
            required,
        });
    }
    Ok(())
}

/// Compute a deterministic BLAKE3 hash over a series.
pub fn compute_dataset_hash(symbol: &str, timeframe: Timeframe, bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    hasher.update(timeframe.as_str().as_bytes());
    for bar in bars {
        hasher.update(&bar.timestamp.and_utc().timestamp().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Seeded random-walk minute bars starting near 3000.
///
/// The seed is derived from the symbol, so each symbol gets its own
/// reproducible path.
pub fn generate_synthetic_minutes(symbol: &str, start: NaiveDateTime, minutes: usize) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(minutes);
    let mut price = 3000.0_f64;
    for i in 0..minutes {
        let ret: f64 = rng.gen_range(-0.0015..0.0015);
        let open = price;
        let close = (price * (1.0 + ret) * 10.0).round() / 10.0;
        let high = open.max(close) + rng.gen_range(0.0..1.5);
        let low = open.min(close) - rng.gen_range(0.0..1.5);
        bars.push(Bar::new(start + Duration::minutes(i as i64), open, high, low, close));
        price = close;
    }
    bars
}

/// Aggregate consecutive minute bars into `timeframe` bars.
///
/// Each output bar is stamped with its last minute; a trailing partial
/// group is kept.
pub fn resample(minutes: &[Bar], timeframe: Timeframe) -> Vec<Bar> {
    let step = timeframe.minutes() as usize;
    if step <= 1 {
        return minutes.to_vec();
    }
    minutes
        .chunks(step)
        .filter_map(|chunk| {
            let first = chunk.first()?;
            let last = chunk.last()?;
            let high = chunk.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
            let low = chunk.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
            Some(Bar::new(last.timestamp, first.open, high, low, last.close))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosslab_core::data::MemoryBarProvider;

    fn opts(synthetic: bool) -> LoadOptions {
        LoadOptions {
            synthetic,
            synthetic_minutes: 600,
            ..LoadOptions::default()
        }
    }

    #[test]
    fn provider_data_is_used_when_present() {
        let mut provider = MemoryBarProvider::new();
        let bars = generate_synthetic_minutes("M2505", LoadOptions::default().synthetic_start, 50);
        provider.insert("M2505", Timeframe::OneMinute, bars.clone());

        let loaded = load_series(&provider, "M2505", Timeframe::OneMinute, &opts(true)).unwrap();
        assert_eq!(loaded.bars, bars);
        assert_eq!(loaded.source, "memory");
        assert!(!loaded.has_synthetic);
    }

    #[test]
    fn missing_data_fails_without_synthetic() {
        let provider = MemoryBarProvider::new();
        let err = load_series(&provider, "M2505", Timeframe::OneMinute, &opts(false)).unwrap_err();
        assert!(matches!(err, LoadError::NoData { .. }));
    }

    #[test]
    fn synthetic_fallback_is_tagged() {
        let provider = MemoryBarProvider::new();
        let loaded =
            load_series(&provider, "RU2505", Timeframe::ThirtyMinutes, &opts(true)).unwrap();
        assert!(loaded.has_synthetic);
        assert_eq!(loaded.source, "synthetic");
        assert_eq!(loaded.bars.len(), 20);
    }

    #[test]
    fn synthetic_data_is_deterministic_per_symbol() {
        let start = LoadOptions::default().synthetic_start;
        let a = generate_synthetic_minutes("M2505", start, 200);
        let b = generate_synthetic_minutes("M2505", start, 200);
        let c = generate_synthetic_minutes("MA2505", start, 200);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|bar| bar.is_sane()));
    }

    #[test]
    fn resample_preserves_extremes_and_close() {
        let start = LoadOptions::default().synthetic_start;
        let minutes = generate_synthetic_minutes("M2505", start, 65);
        let five = resample(&minutes, Timeframe::FiveMinutes);
        assert_eq!(five.len(), 13);
        assert_eq!(five[0].open, minutes[0].open);
        assert_eq!(five[0].close, minutes[4].close);
        assert_eq!(five[0].timestamp, minutes[4].timestamp);
        let max_high = minutes[..5].iter().map(|b| b.high).fold(f64::MIN, f64::max);
        assert_eq!(five[0].high, max_high);
        assert_eq!(resample(&minutes, Timeframe::OneMinute), minutes);
    }

    #[test]
    fn dataset_hash_is_deterministic() {
        let start = LoadOptions::default().synthetic_start;
        let bars = generate_synthetic_minutes("M2505", start, 30);
        let h1 = compute_dataset_hash("M2505", Timeframe::OneMinute, &bars);
        let h2 = compute_dataset_hash("M2505", Timeframe::OneMinute, &bars);
        let h3 = compute_dataset_hash("M2505", Timeframe::OneMinute, &bars[1..]);
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 64);
    }
}
