//! Reported quarterly revenue growth.

use screener_core::types::{round_to, IncomeStatement, ScoreRow, ScoreTable};
use screener_stats::{mean, pct_change};

use crate::BySymbol;

/// Default number of recent quarters averaged.
pub const DEFAULT_REVENUE_LOOKBACK_QUARTERS: usize = 4;

/// Mean quarter-over-quarter revenue growth in percent, rounded to 2 decimals.
///
/// Statements are sorted by date, quarters without positive revenue are
/// dropped and the last `lookback` quarters are used. Writes
/// `avg_quarterly_revenue_growth`; symbols with a single usable quarter keep
/// an empty cell.
pub fn quarterly_revenue_growth(statements: &BySymbol<Vec<IncomeStatement>>, lookback: usize) -> ScoreTable {
    let mut table = ScoreTable::with_columns(&["avg_quarterly_revenue_growth"]);

    for (symbol, rows) in statements {
        if rows.is_empty() {
            continue;
        }
        let mut dated: Vec<(_, f64)> = rows
            .iter()
            .filter_map(|r| Some((r.date?, r.revenue?)))
            .filter(|(_, revenue)| *revenue > 0.0)
            .collect();
        dated.sort_by_key(|(date, _)| *date);

        let revenue: Vec<f64> = dated[dated.len().saturating_sub(lookback)..]
            .iter()
            .map(|(_, r)| *r)
            .collect();
        let growth: Vec<f64> = pct_change(&revenue).into_iter().flatten().collect();
        let avg = mean(&growth).map(|g| round_to(g * 100.0, 2));

        table.push(ScoreRow::new(symbol.clone()).with("avg_quarterly_revenue_growth", avg));
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn statement(month: u32, revenue: f64) -> IncomeStatement {
        IncomeStatement {
            date: NaiveDate::from_ymd_opt(2024, month, 28),
            revenue: Some(revenue),
            ..Default::default()
        }
    }

    #[test]
    fn test_quarterly_revenue_growth() {
        let mut data = BySymbol::new();
        data.insert(
            "AAA".to_string(),
            vec![
                statement(12, 133.1),
                statement(3, 100.0),
                statement(1, 0.0),
                statement(6, 110.0),
                statement(9, 121.0),
                statement(2, 5.0),
            ],
        );
        data.insert("ONE".to_string(), vec![statement(3, 100.0)]);

        let table = quarterly_revenue_growth(&data, DEFAULT_REVENUE_LOOKBACK_QUARTERS);

        assert_eq!(table.number("AAA", "avg_quarterly_revenue_growth"), Some(10.0));
        assert_eq!(table.number("ONE", "avg_quarterly_revenue_growth"), None);
        assert!(table.contains("ONE"));
    }
}
