//! Distance from the 52-week high.

use chrono::{Duration, NaiveDate};
use screener_core::error::StatsError;
use screener_core::types::{PriceHistory, ScoreRow, ScoreTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ensure_finite, ensure_nonzero, ScreenConfig};
use crate::BySymbol;

/// Trading days in a year.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

/// Configuration for the 52-week low screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiftyTwoWeekLowConfig {
    /// Minimum drop from the high (0.5 = 50% below); `None` keeps every symbol
    pub min_price_drop: Option<f64>,
    /// Minimum number of bars required
    pub min_bars: usize,
    /// The newest bar must be within this many days of the as-of date
    pub max_staleness_days: i64,
}

impl Default for FiftyTwoWeekLowConfig {
    fn default() -> Self {
        Self {
            min_price_drop: Some(0.5),
            min_bars: TRADING_DAYS_PER_YEAR,
            max_staleness_days: 365,
        }
    }
}

impl ScreenConfig for FiftyTwoWeekLowConfig {
    fn validate(&self) -> Result<(), StatsError> {
        ensure_finite("min_price_drop", self.min_price_drop)?;
        ensure_nonzero("min_bars", self.min_bars)?;
        if self.max_staleness_days <= 0 {
            return Err(StatsError::InvalidParameter(
                "max_staleness_days must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Finds stocks trading far below their 52-week high.
#[derive(Debug, Clone, Default)]
pub struct FiftyTwoWeekLowScreener {
    config: FiftyTwoWeekLowConfig,
}

impl FiftyTwoWeekLowScreener {
    /// Create a screener with the given configuration.
    pub fn new(config: FiftyTwoWeekLowConfig) -> Self {
        Self { config }
    }

    /// Screen price histories.
    ///
    /// `price_drop_percent = (high - last) / high` where `high` is the highest
    /// close in the history. Rows are sorted by drop, largest first.
    pub fn screen(&self, prices: &BySymbol<PriceHistory>, as_of: NaiveDate) -> ScoreTable {
        let mut table = ScoreTable::with_columns(&[
            "price_drop_percent",
            "fifty_two_week_high",
            "current_close",
        ]);
        let recent_cutoff = as_of - Duration::days(self.config.max_staleness_days);

        for (symbol, history) in prices {
            if history.len() < self.config.min_bars {
                debug!(symbol = %symbol, bars = history.len(), "Not enough price history");
                continue;
            }
            let (Some(last), Some(high)) = (history.last(), history.max_close()) else {
                continue;
            };
            if last.date < recent_cutoff || high <= 0.0 {
                debug!(symbol = %symbol, "No recent prices");
                continue;
            }

            let drop = (high - last.close) / high;
            if self.config.min_price_drop.is_some_and(|min| drop < min) {
                continue;
            }

            table.push(
                ScoreRow::new(symbol.clone())
                    .with("price_drop_percent", drop)
                    .with("fifty_two_week_high", high)
                    .with("current_close", last.close),
            );
        }

        table.sort_by("price_drop_percent", true);
        table
    }
}
