//! Indicator engine.
//!
//! Indicators are pure functions of a bar series and are computed once per
//! series. Internally every series is a `Vec<f64>` of the same length as the
//! input with `f64::NAN` marking warm-up; [`IndicatorFrame`] exposes those
//! positions as `None` so downstream code cannot mistake them for prices.

pub mod ema;
pub mod frame;
pub mod slope;

pub use ema::{ema_of_series, Ema};
pub use frame::{compute_frames, IndicatorFrame, IndicatorParams};
pub use slope::{crossing_angle_degrees, lagged_slope, SLOPE_LAG};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum IndicatorError {
    #[error("insufficient history: need {required} bars, have {available}")]
    InsufficientHistory { required: usize, available: usize },

    #[error("invalid EMA periods: fast={fast}, slow={slow} (need 1 <= fast < slow)")]
    InvalidPeriods { fast: usize, slow: usize },
}

/// Check that a series is long enough to define the slow EMA.
pub fn require_history(available: usize, required: usize) -> Result<(), IndicatorError> {
    if available < required {
        return Err(IndicatorError::InsufficientHistory {
            required,
            available,
        });
    }
    Ok(())
}

/// Create synthetic minute bars from close prices for testing.
///
/// open = prev_close (or close for first bar),
/// high = max(open,close) + 0.5, low = min(open,close) - 0.5.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2025, 1, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar::new(
                base + chrono::Duration::minutes(i as i64),
                open,
                open.max(close) + 0.5,
                open.min(close) - 0.5,
                close,
            )
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
