//! A bar together with the EMA pair derived from it.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{crossing_angle_degrees, lagged_slope, Ema, IndicatorError, SLOPE_LAG};
use crate::domain::{Bar, Direction};

/// EMA periods for the fast/slow pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            fast_period: 8,
            slow_period: 21,
        }
    }
}

impl IndicatorParams {
    pub fn new(fast_period: usize, slow_period: usize) -> Result<Self, IndicatorError> {
        let params = Self {
            fast_period,
            slow_period,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.fast_period == 0 || self.slow_period <= self.fast_period {
            return Err(IndicatorError::InvalidPeriods {
                fast: self.fast_period,
                slow: self.slow_period,
            });
        }
        Ok(())
    }

    /// Bars needed before both EMAs are defined.
    pub fn warmup_bars(&self) -> usize {
        self.slow_period
    }
}

/// One bar plus its indicator values. `None` marks warm-up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorFrame {
    pub bar: Bar,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub ema_fast_slope: Option<f64>,
    pub ema_slow_slope: Option<f64>,
    pub angle_degrees: Option<f64>,
}

impl IndicatorFrame {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.bar.timestamp
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }

    /// `fast - slow` when both EMAs are defined.
    pub fn spread(&self) -> Option<f64> {
        Some(self.ema_fast? - self.ema_slow?)
    }

    /// Which side of the slow EMA the fast EMA is on, once both exist.
    pub fn state(&self) -> Option<Direction> {
        Some(Direction::from_spread(self.ema_fast?, self.ema_slow?))
    }
}

fn defined(v: f64) -> Option<f64> {
    if v.is_nan() {
        None
    } else {
        Some(v)
    }
}

/// Compute the indicator frame for every bar.
///
/// Output has the same length and order as `bars`. Short series are not an
/// error: the EMAs simply stay undefined.
pub fn compute_frames(bars: &[Bar], params: &IndicatorParams) -> Vec<IndicatorFrame> {
    let fast = Ema::new(params.fast_period).compute(bars);
    let slow = Ema::new(params.slow_period).compute(bars);
    let fast_slope = lagged_slope(&fast, SLOPE_LAG);
    let slow_slope = lagged_slope(&slow, SLOPE_LAG);

    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let fs = defined(fast_slope[i]);
            let ss = defined(slow_slope[i]);
            let angle = match (fs, ss) {
                (Some(f), Some(s)) => Some(crossing_angle_degrees(f, s)),
                _ => None,
            };
            IndicatorFrame {
                bar: *bar,
                ema_fast: defined(fast[i]),
                ema_slow: defined(slow[i]),
                ema_fast_slope: fs,
                ema_slow_slope: ss,
                angle_degrees: angle,
            }
        })
        .collect()
}
