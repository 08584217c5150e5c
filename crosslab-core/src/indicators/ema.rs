//! Exponential moving average, seeded with the simple average of the first
//! `period` inputs.
//!
//! The first defined value sits at index `period - 1`; every later value is
//! `alpha * x + (1 - alpha) * prev` with `alpha = 2 / (period + 1)`.

use crate::domain::Bar;

/// Streaming EMA over one series.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    seen: usize,
    seed_sum: f64,
    value: Option<f64>,
    poisoned: bool,
}

impl Ema {
    /// A zero period is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seen: 0,
            seed_sum: 0.0,
            value: None,
            poisoned: false,
        }
    }

    /// Feed the next input and return the average after it, if defined.
    ///
    /// A `NaN` input leaves the average undefined from then on.
    pub fn update(&mut self, x: f64) -> Option<f64> {
        if self.poisoned || x.is_nan() {
            self.poisoned = true;
            self.value = None;
            return None;
        }
        self.seen += 1;
        self.value = match self.value {
            Some(prev) => Some(self.alpha * x + (1.0 - self.alpha) * prev),
            None => {
                self.seed_sum += x;
                (self.seen == self.period).then(|| self.seed_sum / self.period as f64)
            }
        };
        self.value
    }

    /// EMA of every close in `bars`, `NaN` where undefined.
    pub fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        ema_of_series(bars.iter().map(|b| b.close), self.period)
    }
}

/// EMA of an arbitrary series, same length as the input, `NaN` where undefined.
pub fn ema_of_series(values: impl IntoIterator<Item = f64>, period: usize) -> Vec<f64> {
    let mut ema = Ema::new(period);
    values
        .into_iter()
        .map(|v| ema.update(v).unwrap_or(f64::NAN))
        .collect()
}
