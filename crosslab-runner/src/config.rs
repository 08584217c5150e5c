//! Serializable backtest configuration.
//!
//! ```toml
//! [backtest]
//! initial_capital = 100000.0
//! data_dir = "data"
//! signal_timeframe = "30min"
//! exit_timeframe = "1min"
//! signal_source = "detect"
//! signals_dir = "signals"
//!
//! [indicators]
//! fast_period = 8
//! slow_period = 21
//! angle_threshold_deg = 15.0
//!
//! [instruments.M2505]
//! take_profit = 1.0
//! multiplier = 10.0
//! ```
//!
//! Every section is optional; omitted values fall back to the defaults the
//! strategy was first run with.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crosslab_core::data::Timeframe;
use crosslab_core::domain::{InstrumentError, InstrumentTable};
use crosslab_core::indicators::IndicatorError;
use crosslab_core::signals::{CrossParams, PredictParams};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Indicators(#[from] IndicatorError),
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Where the simulator's events come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    /// Run the detector over the signal-timeframe bars.
    #[default]
    Detect,
    /// Read previously written golden/death cross files.
    Files,
}

/// `[backtest]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_capital: f64,
    /// Root of the `{timeframe}/{symbol}_*.csv` bar store.
    pub data_dir: PathBuf,
    pub signal_timeframe: Timeframe,
    /// Resolution used for entry and exit fills.
    pub exit_timeframe: Timeframe,
    pub signal_source: SignalSource,
    /// Root of the `{timeframe}/{symbol}_*_cross.csv` signal files.
    pub signals_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Instruments to run. Empty means every configured instrument.
    pub symbols: Vec<String>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            data_dir: PathBuf::from("data"),
            signal_timeframe: Timeframe::ThirtyMinutes,
            exit_timeframe: Timeframe::OneMinute,
            signal_source: SignalSource::Detect,
            signals_dir: PathBuf::from("signals"),
            output_dir: PathBuf::from("output"),
            symbols: Vec::new(),
        }
    }
}

fn default_instruments() -> InstrumentTable {
    InstrumentTable::with_defaults()
}

/// Full run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub indicators: CrossParams,
    #[serde(default)]
    pub predictor: PredictParams,
    #[serde(default = "default_instruments")]
    pub instruments: InstrumentTable,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            backtest: BacktestSection::default(),
            indicators: CrossParams::default(),
            predictor: PredictParams::default(),
            instruments: default_instruments(),
        }
    }
}

impl BacktestConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let capital = self.backtest.initial_capital;
        if !(capital.is_finite() && capital > 0.0) {
            return Err(ConfigError::Invalid {
                field: "backtest.initial_capital",
                reason: format!("must be finite and > 0, got {capital}"),
            });
        }
        self.indicators.indicators.validate()?;
        let threshold = self.indicators.angle_threshold_deg;
        if !(threshold.is_finite() && (0.0..90.0).contains(&threshold)) {
            return Err(ConfigError::Invalid {
                field: "indicators.angle_threshold_deg",
                reason: format!("must be in [0, 90), got {threshold}"),
            });
        }
        if self.predictor.window < 2 || self.predictor.min_bars < self.predictor.window {
            return Err(ConfigError::Invalid {
                field: "predictor",
                reason: "window must be >= 2 and <= min_bars".into(),
            });
        }
        if self.instruments.is_empty() {
            return Err(ConfigError::Invalid {
                field: "instruments",
                reason: "at least one instrument is required".into(),
            });
        }
        self.instruments.validate()?;
        for symbol in &self.backtest.symbols {
            self.instruments.get(symbol)?;
        }
        Ok(())
    }

    /// Symbols to run: the explicit list, else every configured instrument.
    pub fn symbols(&self) -> Vec<String> {
        if self.backtest.symbols.is_empty() {
            self.instruments.symbols()
        } else {
            self.backtest.symbols.clone()
        }
    }

    /// Deterministic BLAKE3 hash of the configuration.
    ///
    /// Two runs with identical configs share the same hash.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}
