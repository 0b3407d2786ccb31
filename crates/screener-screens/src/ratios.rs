//! Financial ratio screens: the quality factor and latest ratio snapshots.

use screener_core::error::StatsError;
use screener_core::types::{FinancialRatios, ScoreRow, ScoreTable};
use screener_stats::cap_column_outliers;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::{ensure_finite, ensure_non_negative, ScreenConfig};
use crate::BySymbol;

/// Configuration for the quality factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityFactorConfig {
    /// Weight of the quarterly component
    pub quarterly_weight: f64,
    /// Weight of the annual component
    pub annual_weight: f64,
    /// Outliers are capped at this many standard deviations
    pub outlier_std_multiplier: f64,
}

impl Default for QualityFactorConfig {
    fn default() -> Self {
        Self {
            quarterly_weight: 0.6,
            annual_weight: 0.4,
            outlier_std_multiplier: screener_stats::DEFAULT_OUTLIER_STD_MULTIPLIER,
        }
    }
}

impl ScreenConfig for QualityFactorConfig {
    fn validate(&self) -> Result<(), StatsError> {
        ensure_finite("quarterly_weight", Some(self.quarterly_weight))?;
        ensure_finite("annual_weight", Some(self.annual_weight))?;
        ensure_non_negative("outlier_std_multiplier", self.outlier_std_multiplier)
    }
}

/// `0.5 * ROE - 0.5 * D/E` of the newest row; missing values count as zero.
fn period_quality(rows: Option<&Vec<FinancialRatios>>) -> f64 {
    let Some(latest) = rows.and_then(|r| r.iter().max_by_key(|x| x.date)) else {
        return 0.0;
    };
    0.5 * latest.return_on_equity.unwrap_or(0.0) - 0.5 * latest.debt_equity_ratio.unwrap_or(0.0)
}

/// Profitability net of leverage, blended across reporting periods.
///
/// Every symbol present in either input gets a `quality_factor`; a period
/// without data contributes zero. Outliers are capped.
pub fn quality_factor(
    quarterly: &BySymbol<Vec<FinancialRatios>>,
    annual: &BySymbol<Vec<FinancialRatios>>,
    config: &QualityFactorConfig,
) -> Result<ScoreTable, StatsError> {
    let symbols: BTreeSet<&String> = quarterly.keys().chain(annual.keys()).collect();
    let mut table = ScoreTable::with_columns(&["quality_factor"]);

    for symbol in symbols {
        let factor = config.quarterly_weight * period_quality(quarterly.get(symbol))
            + config.annual_weight * period_quality(annual.get(symbol));
        table.push(ScoreRow::new(symbol.clone()).with("quality_factor", factor));
    }

    cap_column_outliers(&mut table, "quality_factor", config.outlier_std_multiplier)?;
    Ok(table)
}

/// Newest ratio row of each symbol, one snake-case column per ratio.
pub fn latest_ratios(ratios: &BySymbol<Vec<FinancialRatios>>) -> ScoreTable {
    let mut table = ScoreTable::new();
    for (symbol, rows) in ratios {
        let Some(latest) = rows.iter().max_by_key(|r| r.date) else {
            continue;
        };
        let mut row = ScoreRow::new(symbol.clone());
        for (column, value) in latest.columns() {
            row.set(column, value);
        }
        table.push(row);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ratios(year: i32, roe: Option<f64>, de: Option<f64>) -> FinancialRatios {
        FinancialRatios {
            date: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
            return_on_equity: roe,
            debt_equity_ratio: de,
            price_earnings_ratio: Some(15.0),
            price_to_sales_ratio: None,
            price_to_book_ratio: None,
            current_ratio: None,
            gross_profit_margin: None,
            net_profit_margin: None,
            dividend_yield: None,
        }
    }

    #[test]
    fn test_quality_factor() {
        let mut quarterly = BySymbol::new();
        quarterly.insert(
            "AAA".to_string(),
            vec![ratios(2023, Some(9.0), Some(9.0)), ratios(2024, Some(0.3), Some(0.1))],
        );
        let mut annual = BySymbol::new();
        annual.insert("AAA".to_string(), vec![ratios(2024, Some(0.2), None)]);
        annual.insert("BBB".to_string(), vec![]);

        let table = quality_factor(&quarterly, &annual, &QualityFactorConfig::default()).unwrap();

        assert_eq!(table.symbols(), vec!["AAA", "BBB"]);
        let expected = 0.6 * (0.15 - 0.05) + 0.4 * 0.1;
        assert!((table.number("AAA", "quality_factor").unwrap() - expected).abs() < 1e-12);
        assert_eq!(table.number("BBB", "quality_factor"), Some(0.0));
    }

    #[test]
    fn test_latest_ratios() {
        let mut data = BySymbol::new();
        data.insert("AAA".to_string(), vec![ratios(2023, Some(1.0), None), ratios(2024, Some(2.0), None)]);

        let table = latest_ratios(&data);

        assert_eq!(table.number("AAA", "return_on_equity"), Some(2.0));
        assert_eq!(table.number("AAA", "price_earnings_ratio"), Some(15.0));
        assert!(table.has_column("dividend_yield"));
    }
}
