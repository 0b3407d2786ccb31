//! Price momentum: six-month change, the 6/12-month momentum factor and
//! simple lookback returns.

use chrono::{Duration, NaiveDate};
use screener_core::error::StatsError;
use screener_core::types::{round_to, PriceHistory, ScoreRow, ScoreTable};
use screener_stats::cap_column_outliers;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ensure_finite, ensure_non_negative, ensure_nonzero, ScreenConfig};
use crate::price_drop::TRADING_DAYS_PER_YEAR;
use crate::BySymbol;

/// Trading days in six months.
pub const TRADING_DAYS_PER_HALF_YEAR: usize = 126;

/// Configuration for the momentum screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumScreenerConfig {
    /// Calendar days of history considered
    pub window_days: i64,
    /// Symbols with fewer bars get a change of zero
    pub min_bars: usize,
    /// Bars between the reference close and the close before the newest
    pub lookback_bars: usize,
}

impl Default for MomentumScreenerConfig {
    fn default() -> Self {
        Self {
            window_days: 400,
            min_bars: TRADING_DAYS_PER_YEAR,
            lookback_bars: TRADING_DAYS_PER_HALF_YEAR,
        }
    }
}

impl ScreenConfig for MomentumScreenerConfig {
    fn validate(&self) -> Result<(), StatsError> {
        if self.window_days <= 0 {
            return Err(StatsError::InvalidParameter(
                "window_days must be greater than 0".into(),
            ));
        }
        ensure_nonzero("min_bars", self.min_bars)?;
        if self.lookback_bars < 2 || self.lookback_bars > self.min_bars {
            return Err(StatsError::InvalidParameter(
                "lookback_bars must be between 2 and min_bars".into(),
            ));
        }
        Ok(())
    }
}

/// Ranks symbols by their six-month price change, skipping the newest day.
#[derive(Debug, Clone, Default)]
pub struct MomentumScreener {
    config: MomentumScreenerConfig,
}

impl MomentumScreener {
    /// Create a screener with the given configuration.
    pub fn new(config: MomentumScreenerConfig) -> Self {
        Self { config }
    }

    /// Compute `momentum_change = (close[-2] - close[-lookback]) / close[-lookback]`.
    ///
    /// Symbols with too little history are kept with a change of `0.0`.
    /// Values are rounded to 4 decimals and sorted descending.
    pub fn screen(&self, prices: &BySymbol<PriceHistory>, as_of: NaiveDate) -> ScoreTable {
        let start = as_of - Duration::days(self.config.window_days);
        let mut table = ScoreTable::with_columns(&["momentum_change"]);

        for (symbol, history) in prices {
            let window = history.since(start);
            let change = if window.len() < self.config.min_bars {
                debug!(symbol = %symbol, bars = window.len(), "Not enough bars for momentum");
                0.0
            } else {
                match (window.close_from_end(2), window.close_from_end(self.config.lookback_bars)) {
                    (Some(current), Some(reference)) if reference != 0.0 => {
                        round_to((current - reference) / reference, 4)
                    }
                    _ => 0.0,
                }
            };
            table.push(ScoreRow::new(symbol.clone()).with("momentum_change", change));
        }

        table.sort_by("momentum_change", true);
        table
    }
}

/// Configuration for the momentum factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumFactorConfig {
    /// Calendar days of history considered
    pub window_days: i64,
    /// Annual risk-free rate subtracted from the returns
    pub risk_free_rate: f64,
    /// Outliers are capped at this many standard deviations
    pub outlier_std_multiplier: f64,
}

impl Default for MomentumFactorConfig {
    fn default() -> Self {
        Self {
            window_days: 400,
            risk_free_rate: 0.015,
            outlier_std_multiplier: screener_stats::DEFAULT_OUTLIER_STD_MULTIPLIER,
        }
    }
}

impl ScreenConfig for MomentumFactorConfig {
    fn validate(&self) -> Result<(), StatsError> {
        if self.window_days <= 0 {
            return Err(StatsError::InvalidParameter(
                "window_days must be greater than 0".into(),
            ));
        }
        ensure_finite("risk_free_rate", Some(self.risk_free_rate))?;
        ensure_non_negative("outlier_std_multiplier", self.outlier_std_multiplier)
    }
}

/// Blend of six- and twelve-month excess returns.
///
/// With `cur = close[-2]`:
/// `momentum_factor = 0.5 * (cur / close[-126] - 1 - rf / 2) + 0.5 * (cur / close[-252] - 1 - rf)`.
/// Symbols with less than a year of bars are skipped; outliers are capped.
pub fn momentum_factor(
    prices: &BySymbol<PriceHistory>,
    as_of: NaiveDate,
    config: &MomentumFactorConfig,
) -> Result<ScoreTable, StatsError> {
    let start = as_of - Duration::days(config.window_days);
    let rf = config.risk_free_rate;
    let mut table = ScoreTable::with_columns(&["momentum_factor"]);

    for (symbol, history) in prices {
        let window = history.since(start);
        if window.len() < TRADING_DAYS_PER_YEAR {
            debug!(symbol = %symbol, bars = window.len(), "Not enough bars for momentum factor");
            continue;
        }
        let (Some(current), Some(half_year), Some(year)) = (
            window.close_from_end(2),
            window.close_from_end(TRADING_DAYS_PER_HALF_YEAR),
            window.close_from_end(TRADING_DAYS_PER_YEAR),
        ) else {
            continue;
        };
        if half_year == 0.0 || year == 0.0 {
            continue;
        }

        let factor = 0.5 * (current / half_year - 1.0 - rf / 2.0) + 0.5 * (current / year - 1.0 - rf);
        table.push(ScoreRow::new(symbol.clone()).with("momentum_factor", factor));
    }

    cap_column_outliers(&mut table, "momentum_factor", config.outlier_std_multiplier)?;
    Ok(table)
}

/// Percentage return from the first to the last close, rounded to 2 decimals.
///
/// Written to `column` (`lookback_return`, `weekly_return`, ...). Symbols with
/// fewer than two bars are skipped. Rows are sorted descending.
pub fn lookback_returns(prices: &BySymbol<PriceHistory>, column: &str) -> ScoreTable {
    let mut table = ScoreTable::with_columns(&[column]);

    for (symbol, history) in prices {
        if history.len() < 2 {
            debug!(symbol = %symbol, "Not enough price data for lookback return");
            continue;
        }
        let (Some(first), Some(last)) = (history.first(), history.last()) else {
            continue;
        };
        if first.close == 0.0 {
            continue;
        }
        let value = round_to((last.close - first.close) / first.close * 100.0, 2);
        table.push(ScoreRow::new(symbol.clone()).with(column, value));
    }

    table.sort_by(column, true);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_core::types::Bar;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    /// One bar per day ending at `as_of`.
    fn daily(symbol: &str, closes: &[f64]) -> PriceHistory {
        let n = closes.len() as i64;
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, c)| Bar::close_only(as_of() - Duration::days(n - 1 - i as i64), *c))
            .collect();
        PriceHistory::new(symbol, bars)
    }

    fn ramp(n: usize) -> Vec<f64> {
        (1..=n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_momentum_change() {
        let mut prices = BySymbol::new();
        prices.insert("UP".to_string(), daily("UP", &ramp(300)));
        prices.insert("NEW".to_string(), daily("NEW", &ramp(50)));

        let table = MomentumScreener::default().screen(&prices, as_of());

        // close[-2] = 299, close[-126] = 175
        let expected = round_to((299.0 - 175.0) / 175.0, 4);
        assert_eq!(table.symbols(), vec!["UP", "NEW"]);
        assert_eq!(table.number("UP", "momentum_change"), Some(expected));
        assert_eq!(table.number("NEW", "momentum_change"), Some(0.0));
    }

    #[test]
    fn test_momentum_window_excludes_old_bars() {
        // 300 daily bars, but only 200 fall inside a 200-day window.
        let config = MomentumScreenerConfig {
            window_days: 199,
            ..Default::default()
        };
        let mut prices = BySymbol::new();
        prices.insert("UP".to_string(), daily("UP", &ramp(300)));

        let table = MomentumScreener::new(config).screen(&prices, as_of());
        assert_eq!(table.number("UP", "momentum_change"), Some(0.0));
    }

    #[test]
    fn test_momentum_factor() {
        let mut prices = BySymbol::new();
        prices.insert("UP".to_string(), daily("UP", &ramp(300)));
        prices.insert("NEW".to_string(), daily("NEW", &ramp(100)));

        let config = MomentumFactorConfig::default();
        let table = momentum_factor(&prices, as_of(), &config).unwrap();

        let (cur, p126, p252) = (299.0, 175.0, 49.0);
        let expected = 0.5 * (cur / p126 - 1.0 - 0.0075) + 0.5 * (cur / p252 - 1.0 - 0.015);
        assert_eq!(table.symbols(), vec!["UP"]);
        assert!((table.number("UP", "momentum_factor").unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_lookback_returns() {
        let mut prices = BySymbol::new();
        prices.insert("AAA".to_string(), daily("AAA", &[100.0, 103.0, 110.0]));
        prices.insert("BBB".to_string(), daily("BBB", &[50.0, 45.0]));
        prices.insert("CCC".to_string(), daily("CCC", &[10.0]));

        let table = lookback_returns(&prices, "weekly_return");

        assert_eq!(table.symbols(), vec!["AAA", "BBB"]);
        assert_eq!(table.number("AAA", "weekly_return"), Some(10.0));
        assert_eq!(table.number("BBB", "weekly_return"), Some(-10.0));
    }

    #[test]
    fn test_config_validation() {
        assert!(MomentumScreenerConfig::default().validate().is_ok());
        let config = MomentumScreenerConfig {
            lookback_bars: 400,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert!(MomentumFactorConfig::default().validate().is_ok());
    }
}
