//! Average annual dividend yield.

use chrono::{Datelike, Duration, NaiveDate};
use screener_core::error::StatsError;
use screener_core::types::{round_to, Dividend, PriceHistory, ScoreRow, ScoreTable};
use screener_stats::mean;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::config::{ensure_non_negative, ScreenConfig};
use crate::BySymbol;

/// Configuration for the dividend yield factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DividendYieldConfig {
    /// Calendar days of dividends and prices considered
    pub lookback_days: i64,
    /// Yields are clamped into `[0, max_yield]`
    pub max_yield: f64,
}

impl Default for DividendYieldConfig {
    fn default() -> Self {
        Self {
            lookback_days: 365 * 3,
            max_yield: 1000.0,
        }
    }
}

impl ScreenConfig for DividendYieldConfig {
    fn validate(&self) -> Result<(), StatsError> {
        if self.lookback_days <= 0 {
            return Err(StatsError::InvalidParameter(
                "lookback_days must be greater than 0".into(),
            ));
        }
        ensure_non_negative("max_yield", self.max_yield)
    }
}

/// Yield per calendar year: dividends paid over the year's mean close, in percent.
pub fn yearly_dividend_yields(dividends: &[Dividend], prices: &PriceHistory, start: NaiveDate) -> BTreeMap<i32, f64> {
    let mut paid: BTreeMap<i32, f64> = BTreeMap::new();
    for dividend in dividends.iter().filter(|d| d.effective_date() >= start) {
        if let Some(amount) = dividend.adj_dividend {
            *paid.entry(dividend.effective_date().year()).or_default() += amount;
        }
    }

    let mut closes: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for bar in prices.iter().filter(|b| b.date >= start) {
        closes.entry(bar.date.year()).or_default().push(bar.close);
    }

    paid.into_iter()
        .filter_map(|(year, total)| {
            let avg_price = closes.get(&year).and_then(|c| mean(c))?;
            if avg_price <= 0.0 {
                return None;
            }
            Some((year, round_to(total / avg_price * 100.0, 2)))
        })
        .collect()
}

/// `avg_dividend_yield` per symbol: the mean of the yearly yields.
///
/// Symbols without prices or without dividends in the window get `0.0`.
pub fn dividend_yield(
    dividends: &BySymbol<Vec<Dividend>>,
    prices: &BySymbol<PriceHistory>,
    as_of: NaiveDate,
    config: &DividendYieldConfig,
) -> ScoreTable {
    let start = as_of - Duration::days(config.lookback_days);
    let symbols: BTreeSet<&String> = prices.keys().chain(dividends.keys()).collect();
    let mut table = ScoreTable::with_columns(&["avg_dividend_yield"]);

    for symbol in symbols {
        let value = match (prices.get(symbol), dividends.get(symbol)) {
            (Some(history), Some(rows)) => {
                let yearly: Vec<f64> = yearly_dividend_yields(rows, history, start).into_values().collect();
                mean(&yearly).unwrap_or(0.0).clamp(0.0, config.max_yield)
            }
            (None, _) => {
                debug!(symbol = %symbol, "No prices for dividend yield");
                0.0
            }
            (Some(_), None) => 0.0,
        };
        table.push(ScoreRow::new(symbol.clone()).with("avg_dividend_yield", value));
    }

    table
}
