//! Analyst estimate screens: expected EPS growth, estimated EPS and revenue
//! changes, and revenue estimate statistics.

use chrono::NaiveDate;
use screener_core::error::StatsError;
use screener_core::types::{round_to, EarningsEstimate, ScoreRow, ScoreTable};
use screener_stats::{coefficient_of_variation, mean, pct_change};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ensure_finite, ensure_nonzero, ScreenConfig};
use crate::BySymbol;

/// Estimates dated on or after `as_of`, oldest first.
fn future_estimates(rows: &[EarningsEstimate], as_of: NaiveDate) -> Vec<&EarningsEstimate> {
    let mut future: Vec<&EarningsEstimate> = rows.iter().filter(|r| r.date >= as_of).collect();
    future.sort_by_key(|r| r.date);
    future
}

/// Mean of the period-over-period changes, in percent.
fn mean_change_percent(values: &[f64]) -> Option<f64> {
    let changes: Vec<f64> = pct_change(values).into_iter().flatten().map(|c| c * 100.0).collect();
    mean(&changes)
}

/// Configuration for the earnings estimate screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EarningsEstimateConfig {
    /// Number of future periods averaged
    pub num_periods: usize,
    /// Minimum average EPS growth (0.1 = 10%)
    pub min_eps_growth: Option<f64>,
    /// Minimum average number of analysts
    pub min_analysts: Option<f64>,
}

impl Default for EarningsEstimateConfig {
    fn default() -> Self {
        Self {
            num_periods: 4,
            min_eps_growth: None,
            min_analysts: None,
        }
    }
}

impl ScreenConfig for EarningsEstimateConfig {
    fn validate(&self) -> Result<(), StatsError> {
        ensure_nonzero("num_periods", self.num_periods)?;
        ensure_finite("min_eps_growth", self.min_eps_growth)?;
        ensure_finite("min_analysts", self.min_analysts)
    }
}

/// Screens on the growth implied by future EPS estimates.
#[derive(Debug, Clone, Default)]
pub struct EarningsEstimateScreener {
    config: EarningsEstimateConfig,
}

impl EarningsEstimateScreener {
    /// Create a screener with the given configuration.
    pub fn new(config: EarningsEstimateConfig) -> Self {
        Self { config }
    }

    /// Compute `avg_eps_growth_percent` and `avg_num_analysts` per symbol.
    ///
    /// Over the first `num_periods` future estimates:
    /// `avg_eps_growth_percent = (mean(eps) - eps[0]) / eps[0]`. Symbols with
    /// fewer future periods, or a zero first estimate, are skipped.
    pub fn screen(&self, estimates: &BySymbol<Vec<EarningsEstimate>>, as_of: NaiveDate) -> ScoreTable {
        let n = self.config.num_periods;
        let mut table = ScoreTable::with_columns(&["avg_eps_growth_percent", "avg_num_analysts"]);

        for (symbol, rows) in estimates {
            let future = future_estimates(rows, as_of);
            if future.len() < n {
                debug!(symbol = %symbol, periods = future.len(), "Not enough future estimates");
                continue;
            }
            let window = &future[..n];

            let eps: Vec<f64> = window.iter().filter_map(|r| r.estimated_eps_avg).collect();
            let (Some(first), Some(avg_eps)) = (window[0].estimated_eps_avg, mean(&eps)) else {
                continue;
            };
            if first == 0.0 {
                continue;
            }
            let growth = (avg_eps - first) / first;

            let analysts: Vec<f64> = window
                .iter()
                .filter_map(|r| r.number_analysts_estimated_eps)
                .collect();
            let avg_analysts = mean(&analysts).unwrap_or(0.0);

            if self.config.min_eps_growth.is_some_and(|min| growth < min) {
                continue;
            }
            if self.config.min_analysts.is_some_and(|min| avg_analysts < min) {
                continue;
            }

            table.push(
                ScoreRow::new(symbol.clone())
                    .with("avg_eps_growth_percent", growth)
                    .with("avg_num_analysts", avg_analysts),
            );
        }

        table
    }
}

/// Mean period-over-period change of future EPS estimates, in percent.
///
/// Writes `avg_estimated_eps_change`, sorted descending. A symbol whose
/// changes are all undefined keeps an empty cell.
pub fn estimated_eps_change(estimates: &BySymbol<Vec<EarningsEstimate>>, as_of: NaiveDate) -> ScoreTable {
    let mut table = ScoreTable::with_columns(&["avg_estimated_eps_change"]);

    for (symbol, rows) in estimates {
        let future = future_estimates(rows, as_of);
        if future.is_empty() {
            continue;
        }
        let eps: Vec<f64> = future.iter().filter_map(|r| r.estimated_eps_avg).collect();
        table.push(ScoreRow::new(symbol.clone()).with("avg_estimated_eps_change", mean_change_percent(&eps)));
    }

    table.sort_by("avg_estimated_eps_change", true);
    table
}

/// Mean period-over-period change of future revenue estimates, in percent.
///
/// Writes `avg_estimated_revenue_change` and `avg_revenue_estimate_analysts`.
pub fn future_revenue_growth(estimates: &BySymbol<Vec<EarningsEstimate>>, as_of: NaiveDate) -> ScoreTable {
    let mut table = ScoreTable::with_columns(&[
        "avg_estimated_revenue_change",
        "avg_revenue_estimate_analysts",
    ]);

    for (symbol, rows) in estimates {
        let future = future_estimates(rows, as_of);
        if future.is_empty() {
            debug!(symbol = %symbol, "No future revenue estimates");
            continue;
        }
        let revenue: Vec<f64> = future.iter().filter_map(|r| r.estimated_revenue_avg).collect();
        let analysts: Vec<f64> = future
            .iter()
            .filter_map(|r| r.number_analyst_estimated_revenue)
            .collect();

        table.push(
            ScoreRow::new(symbol.clone())
                .with("avg_estimated_revenue_change", mean_change_percent(&revenue))
                .with("avg_revenue_estimate_analysts", mean(&analysts)),
        );
    }

    table
}

/// Mean period-over-period change of future net income estimates, in percent.
///
/// Writes `avg_estimated_net_income_change`; symbols without future
/// estimates are left out.
pub fn estimated_net_income_change(
    estimates: &BySymbol<Vec<EarningsEstimate>>,
    as_of: NaiveDate,
) -> ScoreTable {
    let mut table = ScoreTable::with_columns(&["avg_estimated_net_income_change"]);

    for (symbol, rows) in estimates {
        let future = future_estimates(rows, as_of);
        if future.is_empty() {
            continue;
        }
        let income: Vec<f64> = future.iter().filter_map(|r| r.estimated_net_income_avg).collect();
        table.push(
            ScoreRow::new(symbol.clone())
                .with("avg_estimated_net_income_change", mean_change_percent(&income)),
        );
    }

    table
}

/// Revenue estimate summary for a single company.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueEstimateStats {
    /// Mean change between consecutive future revenue estimates
    pub avg_revenue_change_percent: f64,
    /// Spread of those changes relative to their mean
    pub revenue_change_coefficient_variation: f64,
    /// Average number of revenue analysts, truncated
    pub avg_num_analysts: u32,
}

impl RevenueEstimateStats {
    /// Summarize estimates dated strictly after `as_of`; no data gives zeros.
    pub fn from_estimates(rows: &[EarningsEstimate], as_of: NaiveDate) -> Self {
        let mut future: Vec<&EarningsEstimate> = rows.iter().filter(|r| r.date > as_of).collect();
        if future.is_empty() {
            return Self::default();
        }
        future.sort_by_key(|r| r.date);

        let revenue: Vec<f64> = future.iter().filter_map(|r| r.estimated_revenue_avg).collect();
        let changes: Vec<f64> = pct_change(&revenue).into_iter().flatten().collect();
        let analysts: Vec<f64> = future
            .iter()
            .filter_map(|r| r.number_analyst_estimated_revenue)
            .collect();

        Self {
            avg_revenue_change_percent: round_to(mean(&changes).unwrap_or(0.0), 2),
            revenue_change_coefficient_variation: round_to(coefficient_of_variation(&changes), 2),
            avg_num_analysts: mean(&analysts).map_or(0, |m| m.max(0.0) as u32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn as_of() -> NaiveDate {
        day(2024, 6)
    }

    fn estimates() -> Vec<EarningsEstimate> {
        vec![
            EarningsEstimate::new(day(2025, 6), 1.5, 150.0, 10.0),
            EarningsEstimate::new(day(2023, 6), 9.0, 900.0, 1.0),
            EarningsEstimate::new(day(2024, 9), 1.0, 100.0, 8.0),
            EarningsEstimate::new(day(2024, 12), 1.2, 120.0, 6.0),
            EarningsEstimate::new(day(2025, 3), 1.3, 132.0, 4.0),
        ]
    }

    #[test]
    fn test_eps_growth() {
        let mut data = BySymbol::new();
        data.insert("AAA".to_string(), estimates());
        data.insert("BBB".to_string(), estimates()[..3].to_vec());

        let table = EarningsEstimateScreener::default().screen(&data, as_of());

        assert_eq!(table.symbols(), vec!["AAA"]);
        let expected = ((1.0 + 1.2 + 1.3 + 1.5) / 4.0 - 1.0) / 1.0;
        assert!((table.number("AAA", "avg_eps_growth_percent").unwrap() - expected).abs() < 1e-9);
        assert_eq!(table.number("AAA", "avg_num_analysts"), Some(7.0));
    }

    #[test]
    fn test_eps_growth_minimums() {
        let mut data = BySymbol::new();
        data.insert("AAA".to_string(), estimates());

        let strict = EarningsEstimateScreener::new(EarningsEstimateConfig {
            min_analysts: Some(8.0),
            ..Default::default()
        });
        assert!(strict.screen(&data, as_of()).is_empty());

        let loose = EarningsEstimateScreener::new(EarningsEstimateConfig {
            min_eps_growth: Some(0.2),
            min_analysts: Some(3.0),
            ..Default::default()
        });
        assert_eq!(loose.screen(&data, as_of()).len(), 1);
    }

    #[test]
    fn test_estimated_eps_change() {
        let mut data = BySymbol::new();
        data.insert("AAA".to_string(), estimates());
        data.insert(
            "ZERO".to_string(),
            vec![
                EarningsEstimate::new(day(2024, 9), 0.0, 1.0, 1.0),
                EarningsEstimate::new(day(2024, 12), 1.0, 1.0, 1.0),
            ],
        );

        let table = estimated_eps_change(&data, as_of());

        assert_eq!(table.symbols(), vec!["AAA", "ZERO"]);
        let expected = (20.0 + (1.3 / 1.2 - 1.0) * 100.0 + (1.5 / 1.3 - 1.0) * 100.0) / 3.0;
        assert!((table.number("AAA", "avg_estimated_eps_change").unwrap() - expected).abs() < 1e-9);
        assert_eq!(table.number("ZERO", "avg_estimated_eps_change"), None);
    }

    #[test]
    fn test_future_revenue_growth() {
        let mut data = BySymbol::new();
        data.insert("AAA".to_string(), estimates());

        let table = future_revenue_growth(&data, as_of());

        let expected = (20.0 + 10.0 + (150.0 / 132.0 - 1.0) * 100.0) / 3.0;
        assert!((table.number("AAA", "avg_estimated_revenue_change").unwrap() - expected).abs() < 1e-9);
        assert_eq!(table.number("AAA", "avg_revenue_estimate_analysts"), Some(7.0));
    }

    #[test]
    fn test_net_income_change() {
        let mut data = BySymbol::new();
        data.insert(
            "AAA".to_string(),
            vec![
                EarningsEstimate::new(day(2025, 12), 1.0, 100.0, 5.0).with_net_income(15.0),
                EarningsEstimate::new(day(2023, 12), 1.0, 100.0, 5.0).with_net_income(1.0),
                EarningsEstimate::new(day(2024, 12), 1.0, 100.0, 5.0).with_net_income(10.0),
            ],
        );
        data.insert("OLD".to_string(), vec![EarningsEstimate::new(day(2020, 12), 1.0, 100.0, 5.0)]);

        let table = estimated_net_income_change(&data, as_of());

        // Past estimates are ignored: 10 -> 15
        assert_eq!(table.symbols(), vec!["AAA"]);
        assert!((table.number("AAA", "avg_estimated_net_income_change").unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_revenue_estimate_stats() {
        let stats = RevenueEstimateStats::from_estimates(&estimates(), as_of());
        let changes = [0.2, 0.1, 150.0 / 132.0 - 1.0];
        let avg = changes.iter().sum::<f64>() / 3.0;

        assert_eq!(stats.avg_revenue_change_percent, round_to(avg, 2));
        assert_eq!(stats.avg_num_analysts, 7);
        assert!(stats.revenue_change_coefficient_variation > 0.0);

        let empty = RevenueEstimateStats::from_estimates(&[], as_of());
        assert_eq!(empty, RevenueEstimateStats::default());
    }
}
