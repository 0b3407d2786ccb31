//! Series trends: percentage change and linear slope.

use screener_core::traits::Indicator;

/// Period-over-period percentage change, `x[i] / x[i-1] - 1`.
///
/// The result has one element fewer than the input. A zero or non-finite
/// denominator yields `None` for that step.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    values
        .windows(2)
        .map(|w| {
            let change = w[1] / w[0] - 1.0;
            if w[0] == 0.0 || !change.is_finite() {
                None
            } else {
                Some(change)
            }
        })
        .collect()
}

/// Least-squares slope of `values` against `0..n`.
///
/// Non-finite values are discarded first; fewer than two remaining points
/// or an all-zero series give `0.0`.
pub fn linear_slope(values: &[f64]) -> f64 {
    let y: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if y.len() < 2 || y.iter().all(|v| *v == 0.0) {
        return 0.0;
    }

    let n = y.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = y.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, v) in y.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (v - y_mean);
        den += dx * dx;
    }

    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// Percentage change indicator.
#[derive(Debug, Clone, Default)]
pub struct PctChange;

impl Indicator for PctChange {
    type Output = Option<f64>;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        pct_change(data)
    }

    fn period(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "pct_change"
    }
}

/// Trend of a fundamentals series: slope of its period-over-period changes.
#[derive(Debug, Clone, Default)]
pub struct LinearTrend;

impl LinearTrend {
    /// Slope of the percentage changes of `data`.
    pub fn trend(&self, data: &[f64]) -> f64 {
        let changes: Vec<f64> = pct_change(data).into_iter().flatten().collect();
        linear_slope(&changes)
    }
}

impl Indicator for LinearTrend {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if self.validate_data(data).is_err() {
            return vec![];
        }
        vec![self.trend(data)]
    }

    fn period(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "linear_trend"
    }
}
