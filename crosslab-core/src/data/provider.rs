//! Bar sources.
//!
//! The `BarProvider` trait abstracts over where bars come from so the runner
//! can load from disk in production and from memory in tests.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::codec::read_bars_file;
use super::DataError;
use crate::domain::Bar;

/// Bar resolution. Each has its own directory under the data root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1min")]
    OneMinute,
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [
        Timeframe::OneMinute,
        Timeframe::FiveMinutes,
        Timeframe::ThirtyMinutes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneMinute => "1min",
            Timeframe::FiveMinutes => "5min",
            Timeframe::ThirtyMinutes => "30min",
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::OneMinute => 1,
            Timeframe::FiveMinutes => 5,
            Timeframe::ThirtyMinutes => 30,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == s.trim())
            .ok_or_else(|| DataError::InvalidTimeframe(s.to_string()))
    }
}

/// Source of bars for one instrument at one resolution.
pub trait BarProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Bars in strictly increasing timestamp order.
    fn bars(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>, DataError>;

    /// Symbols with data at this resolution, sorted.
    fn symbols(&self, timeframe: Timeframe) -> Result<Vec<String>, DataError>;
}

/// Reads `root/{timeframe}/{symbol}_{stamp}.csv`, choosing the
/// lexicographically greatest file name per symbol.
#[derive(Debug, Clone)]
pub struct CsvBarStore {
    root: PathBuf,
}

impl CsvBarStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn timeframe_dir(&self, timeframe: Timeframe) -> PathBuf {
        self.root.join(timeframe.as_str())
    }

    /// All `(symbol, path)` pairs in a timeframe directory, newest file per symbol.
    fn latest_files(&self, timeframe: Timeframe) -> Result<BTreeMap<String, PathBuf>, DataError> {
        let dir = self.timeframe_dir(timeframe);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(DataError::io(&dir, e)),
        };

        let mut latest: BTreeMap<String, PathBuf> = BTreeMap::new();
        for entry in entries {
            let path = entry.map_err(|e| DataError::io(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some((symbol, _)) = name.split_once('_') else {
                continue;
            };
            let newer = latest
                .get(symbol)
                .map_or(true, |current| current.file_name() < path.file_name());
            if newer {
                latest.insert(symbol.to_string(), path);
            }
        }
        Ok(latest)
    }

    /// Path of the file `bars` would read.
    pub fn latest_file(&self, symbol: &str, timeframe: Timeframe) -> Result<PathBuf, DataError> {
        self.latest_files(timeframe)?
            .remove(symbol)
            .ok_or_else(|| DataError::NoDataFile {
                symbol: symbol.to_string(),
                dir: self.timeframe_dir(timeframe),
            })
    }
}

impl BarProvider for CsvBarStore {
    fn name(&self) -> &str {
        "csv"
    }

    fn bars(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>, DataError> {
        let path = self.latest_file(symbol, timeframe)?;
        read_bars_file(&path)
    }

    fn symbols(&self, timeframe: Timeframe) -> Result<Vec<String>, DataError> {
        Ok(self.latest_files(timeframe)?.into_keys().collect())
    }
}

/// In-memory bars keyed by symbol and timeframe.
#[derive(Debug, Clone, Default)]
pub struct MemoryBarProvider {
    series: BTreeMap<(String, Timeframe), Vec<Bar>>,
}

impl MemoryBarProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, timeframe: Timeframe, bars: Vec<Bar>) {
        self.series
            .insert((symbol.into(), timeframe), crate::domain::normalize_bars(bars));
    }
}

impl BarProvider for MemoryBarProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn bars(&self, symbol: &str, timeframe: Timeframe) -> Result<Vec<Bar>, DataError> {
        self.series
            .get(&(symbol.to_string(), timeframe))
            .cloned()
            .ok_or_else(|| DataError::NoDataFile {
                symbol: symbol.to_string(),
                dir: PathBuf::from(format!("memory/{timeframe}")),
            })
    }

    fn symbols(&self, timeframe: Timeframe) -> Result<Vec<String>, DataError> {
        Ok(self
            .series
            .keys()
            .filter(|(_, tf)| *tf == timeframe)
            .map(|(symbol, _)| symbol.clone())
            .collect())
    }
}
