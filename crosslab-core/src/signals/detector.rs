//! EMA crossover detector with a minimum-angle filter.
//!
//! A flip is the first bar where the sign of `ema_fast - ema_slow` differs
//! from the previous bar. Only flips whose crossing angle is steeper than the
//! threshold, in the direction of the flip, become events.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Bar, CrossEvent, Direction};
use crate::indicators::{
    compute_frames, require_history, IndicatorError, IndicatorFrame, IndicatorParams,
};

/// Detector parameters: the EMA pair plus the angle filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossParams {
    #[serde(flatten)]
    pub indicators: IndicatorParams,
    pub angle_threshold_deg: f64,
}

impl Default for CrossParams {
    fn default() -> Self {
        Self {
            indicators: IndicatorParams::default(),
            angle_threshold_deg: 15.0,
        }
    }
}

impl CrossParams {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        angle_threshold_deg: f64,
    ) -> Result<Self, IndicatorError> {
        Ok(Self {
            indicators: IndicatorParams::new(fast_period, slow_period)?,
            angle_threshold_deg,
        })
    }

    /// Whether `angle` qualifies a flip towards `direction`. Strict inequality.
    pub fn passes_angle(&self, direction: Direction, angle: f64) -> bool {
        match direction {
            Direction::Up => angle > self.angle_threshold_deg,
            Direction::Down => angle < -self.angle_threshold_deg,
        }
    }
}

/// Crossover detector bound to one parameter set.
#[derive(Debug, Clone, Default)]
pub struct CrossDetector {
    params: CrossParams,
}

impl CrossDetector {
    pub fn new(params: CrossParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CrossParams {
        &self.params
    }

    /// Compute frames and detect crosses in one pass over `bars`.
    pub fn detect(&self, bars: &[Bar]) -> Vec<CrossEvent> {
        if let Err(err) = require_history(bars.len(), self.params.indicators.warmup_bars()) {
            debug!(%err, "no crosses possible yet");
            return Vec::new();
        }
        let frames = compute_frames(bars, &self.params.indicators);
        detect_in_frames(&frames, &self.params)
    }
}

/// Detect angle-qualified crosses in precomputed frames, oldest first.
pub fn detect_in_frames(frames: &[IndicatorFrame], params: &CrossParams) -> Vec<CrossEvent> {
    let mut events = Vec::new();

    for pair in frames.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let (Some(prev_state), Some(cur_state)) = (prev.state(), cur.state()) else {
            continue;
        };
        if prev_state == cur_state {
            continue;
        }
        // Flip with an undefined angle cannot pass the filter.
        let Some(angle) = cur.angle_degrees else {
            continue;
        };
        if !params.passes_angle(cur_state, angle) {
            continue;
        }
        let (Some(ema_fast), Some(ema_slow)) = (cur.ema_fast, cur.ema_slow) else {
            continue;
        };
        events.push(CrossEvent {
            timestamp: cur.timestamp(),
            price: cur.close(),
            direction: cur_state,
            angle_degrees: angle,
            ema_fast,
            ema_slow,
        });
    }

    events
}

/// Detect crosses directly from bars.
pub fn detect_crosses(
    bars: &[Bar],
    fast_period: usize,
    slow_period: usize,
    angle_threshold_deg: f64,
) -> Vec<CrossEvent> {
    CrossDetector::new(CrossParams {
        indicators: IndicatorParams {
            fast_period,
            slow_period,
        },
        angle_threshold_deg,
    })
    .detect(bars)
}
