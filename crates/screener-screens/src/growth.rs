//! Growth screens: quarter-over-quarter acceleration and the annual growth factor.

use screener_core::error::StatsError;
use screener_core::types::{IncomeGrowth, ScoreRow, ScoreTable};
use screener_stats::cap_column_outliers;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ensure_finite, ensure_non_negative, ScreenConfig};
use crate::BySymbol;

/// Configuration for the growth acceleration screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthScreenerConfig {
    /// Minimum last-quarter revenue growth (0.1 = 10%)
    pub min_revenue_growth: f64,
    /// Minimum last-quarter net income growth
    pub min_earnings_growth: f64,
    /// Number of most recent quarters considered
    pub lookback_quarters: usize,
}

impl Default for GrowthScreenerConfig {
    fn default() -> Self {
        Self {
            min_revenue_growth: 0.1,
            min_earnings_growth: 0.1,
            lookback_quarters: 4,
        }
    }
}

impl ScreenConfig for GrowthScreenerConfig {
    fn validate(&self) -> Result<(), StatsError> {
        ensure_finite("min_revenue_growth", Some(self.min_revenue_growth))?;
        ensure_finite("min_earnings_growth", Some(self.min_earnings_growth))?;
        if self.lookback_quarters < 2 {
            return Err(StatsError::InvalidParameter(
                "lookback_quarters must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

/// Keeps companies whose revenue and earnings growth are both strong and
/// accelerating quarter over quarter.
#[derive(Debug, Clone, Default)]
pub struct GrowthScreener {
    config: GrowthScreenerConfig,
}

impl GrowthScreener {
    /// Create a screener with the given configuration.
    pub fn new(config: GrowthScreenerConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &GrowthScreenerConfig {
        &self.config
    }

    /// Screen quarterly growth rows.
    ///
    /// # Arguments
    /// * `growth` - Quarterly income growth per symbol, any order
    ///
    /// # Returns
    /// One row per passing symbol with `last_quarter_earnings_growth`,
    /// `last_quarter_revenue_growth`, `earnings_acceleration` and
    /// `revenue_acceleration`
    pub fn screen(&self, growth: &BySymbol<Vec<IncomeGrowth>>) -> ScoreTable {
        let mut table = ScoreTable::with_columns(&[
            "last_quarter_earnings_growth",
            "last_quarter_revenue_growth",
            "earnings_acceleration",
            "revenue_acceleration",
        ]);

        for (symbol, rows) in growth {
            let Some(stats) = self.quarter_stats(rows) else {
                debug!(symbol = %symbol, "Not enough growth data");
                continue;
            };

            let passes = stats.revenue >= self.config.min_revenue_growth
                && stats.earnings >= self.config.min_earnings_growth
                && stats.revenue_accelerating
                && stats.earnings_accelerating;
            if !passes {
                continue;
            }

            table.push(
                ScoreRow::new(symbol.clone())
                    .with("last_quarter_earnings_growth", stats.earnings)
                    .with("last_quarter_revenue_growth", stats.revenue)
                    .with("earnings_acceleration", stats.earnings_accelerating)
                    .with("revenue_acceleration", stats.revenue_accelerating),
            );
        }

        table
    }

    fn quarter_stats(&self, rows: &[IncomeGrowth]) -> Option<QuarterStats> {
        let mut sorted: Vec<&IncomeGrowth> = rows.iter().collect();
        sorted.sort_by_key(|r| r.date);
        let recent = &sorted[sorted.len().saturating_sub(self.config.lookback_quarters)..];
        if recent.len() < 2 {
            return None;
        }

        let last = recent[recent.len() - 1];
        let previous = recent[recent.len() - 2];
        let revenue = last.growth_revenue?;
        let earnings = last.growth_net_income?;

        Some(QuarterStats {
            revenue,
            earnings,
            revenue_accelerating: previous.growth_revenue.is_some_and(|p| revenue > p),
            earnings_accelerating: previous.growth_net_income.is_some_and(|p| earnings > p),
        })
    }
}

struct QuarterStats {
    revenue: f64,
    earnings: f64,
    revenue_accelerating: bool,
    earnings_accelerating: bool,
}

/// Configuration for the annual growth factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthFactorConfig {
    /// Weight of revenue growth
    pub revenue_weight: f64,
    /// Weight of net income growth
    pub net_income_weight: f64,
    /// Outliers are capped at this many standard deviations
    pub outlier_std_multiplier: f64,
}

impl Default for GrowthFactorConfig {
    fn default() -> Self {
        Self {
            revenue_weight: 0.66,
            net_income_weight: 0.33,
            outlier_std_multiplier: screener_stats::DEFAULT_OUTLIER_STD_MULTIPLIER,
        }
    }
}

impl ScreenConfig for GrowthFactorConfig {
    fn validate(&self) -> Result<(), StatsError> {
        ensure_finite("revenue_weight", Some(self.revenue_weight))?;
        ensure_finite("net_income_weight", Some(self.net_income_weight))?;
        ensure_non_negative("outlier_std_multiplier", self.outlier_std_multiplier)?;
        if self.revenue_weight == 0.0 && self.net_income_weight == 0.0 {
            return Err(StatsError::InvalidParameter(
                "At least one growth weight must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Annual growth factor from the newest growth row of each symbol.
///
/// `growth_factor = 0.66 * growth_revenue + 0.33 * growth_net_income` with
/// the default weights; a missing component counts as zero. Symbols without
/// growth data are skipped.
pub fn growth_factor(
    annual: &BySymbol<Vec<IncomeGrowth>>,
    config: &GrowthFactorConfig,
) -> Result<ScoreTable, StatsError> {
    let mut table = ScoreTable::with_columns(&["growth_factor"]);

    for (symbol, rows) in annual {
        let Some(latest) = rows.iter().max_by_key(|r| r.date) else {
            continue;
        };
        if latest.growth_revenue.is_none() && latest.growth_net_income.is_none() {
            continue;
        }
        let factor = config.revenue_weight * latest.growth_revenue.unwrap_or(0.0)
            + config.net_income_weight * latest.growth_net_income.unwrap_or(0.0);
        table.push(ScoreRow::new(symbol.clone()).with("growth_factor", factor));
    }

    cap_column_outliers(&mut table, "growth_factor", config.outlier_std_multiplier)?;
    Ok(table)
}
