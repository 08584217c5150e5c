//! Near-cross prediction.
//!
//! Flags a series whose EMAs are within a small band of each other and
//! converging, before the cross itself happens. Used by monitoring, not by
//! the simulator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::Direction;
use crate::indicators::IndicatorFrame;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictParams {
    /// Minimum series length before predicting anything.
    pub min_bars: usize,
    /// Number of trailing frames the trends are measured over.
    pub window: usize,
    /// Maximum |fast - slow| as a fraction of the latest close.
    pub max_spread_frac: f64,
}

impl Default for PredictParams {
    fn default() -> Self {
        Self {
            min_bars: 30,
            window: 5,
            max_spread_frac: 0.002,
        }
    }
}

/// A cross that looks imminent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotentialCross {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub direction: Direction,
    /// 0..=100
    pub confidence: u8,
}

/// Mean of successive differences; `None` when fewer than two values.
fn mean_diff(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let diffs: f64 = values.windows(2).map(|w| w[1] - w[0]).sum();
    Some(diffs / (values.len() - 1) as f64)
}

/// Predict an upcoming cross from the trailing window of `frames`.
pub fn predict_cross(frames: &[IndicatorFrame], params: &PredictParams) -> Option<PotentialCross> {
    if frames.len() < params.min_bars || params.window < 2 || frames.len() < params.window {
        return None;
    }
    let recent = &frames[frames.len() - params.window..];

    let spreads: Vec<f64> = recent.iter().filter_map(|f| f.spread()).collect();
    let slope_diffs: Vec<f64> = recent
        .iter()
        .filter_map(|f| Some(f.ema_fast_slope? - f.ema_slow_slope?))
        .collect();
    if spreads.len() != recent.len() || slope_diffs.len() != recent.len() {
        return None;
    }

    let latest = recent.last()?;
    let spread = *spreads.last()?;
    if spread.abs() >= latest.close() * params.max_spread_frac {
        return None;
    }

    let spread_trend = mean_diff(&spreads)?;
    let slope_trend = mean_diff(&slope_diffs)?;
    let direction = if spread_trend > 0.0 && slope_trend > 0.0 {
        Direction::Up
    } else if spread_trend < 0.0 && slope_trend < 0.0 {
        Direction::Down
    } else {
        return None;
    };

    let confidence = (spread_trend.abs() * 1000.0).min(100.0) as u8;
    Some(PotentialCross {
        timestamp: latest.timestamp(),
        close: latest.close(),
        direction,
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use chrono::NaiveDate;

    fn series(
        n: usize,
        spread_at: impl Fn(usize) -> f64,
        slope_diff_at: impl Fn(usize) -> f64,
    ) -> Vec<IndicatorFrame> {
        let base = NaiveDate::from_ymd_opt(2025, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| IndicatorFrame {
                bar: Bar::new(
                    base + chrono::Duration::minutes(5 * i as i64),
                    3000.0,
                    3001.0,
                    2999.0,
                    3000.0,
                ),
                ema_fast: Some(3000.0 + spread_at(i)),
                ema_slow: Some(3000.0),
                ema_fast_slope: Some(slope_diff_at(i)),
                ema_slow_slope: Some(0.0),
                angle_degrees: None,
            })
            .collect()
    }

    #[test]
    fn converging_from_below_predicts_up() {
        // Spread rises by 0.05 per bar towards zero: -0.25 .. -0.05 at the end.
        let frames = series(30, |i| -0.05 * (30 - i) as f64, |i| 0.01 * i as f64);
        let p = predict_cross(&frames, &PredictParams::default()).unwrap();
        assert_eq!(p.direction, Direction::Up);
        // |mean spread change| = 0.05 per bar → ~50
        assert!((49..=50).contains(&p.confidence));
    }

    #[test]
    fn converging_from_above_predicts_down() {
        let frames = series(30, |i| 0.05 * (30 - i) as f64, |i| -0.01 * i as f64);
        let p = predict_cross(&frames, &PredictParams::default()).unwrap();
        assert_eq!(p.direction, Direction::Down);
    }

    #[test]
    fn wide_spread_predicts_nothing() {
        // 0.2% of 3000 = 6.0
        let frames = series(30, |_| 10.0, |i| 0.01 * i as f64);
        assert!(predict_cross(&frames, &PredictParams::default()).is_none());
    }

    #[test]
    fn mixed_trends_predict_nothing() {
        let frames = series(30, |i| -0.05 * (30 - i) as f64, |i| -0.01 * i as f64);
        assert!(predict_cross(&frames, &PredictParams::default()).is_none());
    }

    #[test]
    fn too_few_bars() {
        let frames = series(29, |i| -0.05 * (30 - i) as f64, |i| 0.01 * i as f64);
        assert!(predict_cross(&frames, &PredictParams::default()).is_none());
    }
}
