//! Short-horizon slope and the crossing angle derived from it.

/// Bars between the two EMA samples a slope is measured over.
pub const SLOPE_LAG: usize = 3;

/// Per-bar slope `(v[t] - v[t-lag]) / lag`; `NaN` where either sample is undefined.
pub fn lagged_slope(values: &[f64], lag: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if lag == 0 {
        return out;
    }
    for t in lag..values.len() {
        let (now, then) = (values[t], values[t - lag]);
        if !now.is_nan() && !then.is_nan() {
            out[t] = (now - then) / lag as f64;
        }
    }
    out
}

/// Angle in degrees of the slope difference measured against a unit run.
///
/// Positive when the fast EMA is rising relative to the slow EMA.
pub fn crossing_angle_degrees(fast_slope: f64, slow_slope: f64) -> f64 {
    (fast_slope - slow_slope).atan2(1.0).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn slope_over_three_bars() {
        let s = lagged_slope(&[1.0, 2.0, 3.0, 7.0, 8.0], 3);
        assert!(s[..3].iter().all(|v| v.is_nan()));
        assert_approx(s[3], 2.0, DEFAULT_EPSILON);
        assert_approx(s[4], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn slope_undefined_until_lag_after_first_value() {
        let s = lagged_slope(&[f64::NAN, f64::NAN, 1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert!(s[..5].iter().all(|v| v.is_nan()));
        assert_approx(s[5], 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn angle_of_unit_difference_is_45() {
        assert_approx(crossing_angle_degrees(1.5, 0.5), 45.0, 1e-12);
        assert_approx(crossing_angle_degrees(0.0, 1.0), -45.0, 1e-12);
        assert_approx(crossing_angle_degrees(0.3, 0.3), 0.0, 1e-12);
    }
}
