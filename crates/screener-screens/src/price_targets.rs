//! Analyst price target statistics.

use chrono::{Duration, NaiveDate};
use screener_core::error::StatsError;
use screener_core::types::{round_to, PriceTarget, ScoreRow, ScoreTable};
use screener_stats::{coefficient_of_variation, mean};
use serde::{Deserialize, Serialize};

use crate::config::ScreenConfig;
use crate::BySymbol;

/// Summary of the price targets published for one symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceTargetStats {
    /// Mean adjusted price target
    pub avg_price_target: f64,
    /// Mean target change relative to the price when posted, in percent
    pub avg_price_target_change: f64,
    /// Standard deviation of the changes over their mean
    pub price_target_coefficient_variation: f64,
    /// Raised targets per lowered target; zero when none were lowered
    pub price_target_agreement_ratio: f64,
    /// Number of targets in the window
    pub num_price_target_analysts: usize,
}

impl PriceTargetStats {
    /// Summarize targets published within `lookback_days` of `as_of`.
    ///
    /// Returns `None` when no target falls in the window.
    pub fn from_targets(targets: &[PriceTarget], as_of: NaiveDate, lookback_days: i64) -> Option<Self> {
        let cutoff = as_of - Duration::days(lookback_days);
        let recent: Vec<&PriceTarget> = targets.iter().filter(|t| t.published_date >= cutoff).collect();
        if recent.is_empty() {
            return None;
        }

        let adjusted: Vec<f64> = recent.iter().filter_map(|t| t.adj_price_target).collect();
        let changes: Vec<f64> = recent.iter().filter_map(|t| t.change_percent()).collect();
        let positives = changes.iter().filter(|c| **c > 0.0).count();
        let negatives = changes.iter().filter(|c| **c < 0.0).count();
        let agreement = if negatives > 0 {
            positives as f64 / negatives as f64
        } else {
            0.0
        };

        Some(Self {
            avg_price_target: round_to(mean(&adjusted).unwrap_or(0.0), 2),
            avg_price_target_change: round_to(mean(&changes).unwrap_or(0.0), 2),
            price_target_coefficient_variation: round_to(coefficient_of_variation(&changes), 2),
            price_target_agreement_ratio: round_to(agreement, 2),
            num_price_target_analysts: recent.len(),
        })
    }

    /// Stats as a table row.
    pub fn to_row(&self, symbol: &str) -> ScoreRow {
        ScoreRow::new(symbol)
            .with("avg_price_target", self.avg_price_target)
            .with("avg_price_target_change", self.avg_price_target_change)
            .with("price_target_coefficient_variation", self.price_target_coefficient_variation)
            .with("price_target_agreement_ratio", self.price_target_agreement_ratio)
            .with("num_price_target_analysts", self.num_price_target_analysts)
    }
}

/// Configuration for the price target screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTargetConfig {
    /// Only targets newer than this many days count
    pub lookback_days: i64,
    /// Minimum number of targets in the window
    pub min_analysts: usize,
}

impl Default for PriceTargetConfig {
    fn default() -> Self {
        Self {
            lookback_days: 120,
            min_analysts: 3,
        }
    }
}

impl ScreenConfig for PriceTargetConfig {
    fn validate(&self) -> Result<(), StatsError> {
        if self.lookback_days <= 0 {
            return Err(StatsError::InvalidParameter(
                "lookback_days must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Ranks symbols by the average upside of recent price targets.
#[derive(Debug, Clone, Default)]
pub struct PriceTargetScreener {
    config: PriceTargetConfig,
}

impl PriceTargetScreener {
    /// Create a screener with the given configuration.
    pub fn new(config: PriceTargetConfig) -> Self {
        Self { config }
    }

    /// Compute target stats, keep well-covered symbols, sort by average change.
    pub fn screen(&self, targets: &BySymbol<Vec<PriceTarget>>, as_of: NaiveDate) -> ScoreTable {
        let mut table = ScoreTable::new();

        for (symbol, rows) in targets {
            let Some(stats) = PriceTargetStats::from_targets(rows, as_of, self.config.lookback_days) else {
                continue;
            };
            if stats.num_price_target_analysts < self.config.min_analysts {
                continue;
            }
            table.push(stats.to_row(symbol));
        }

        table.sort_by("avg_price_target_change", true);
        table
    }
}
