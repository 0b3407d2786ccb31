//! Column scaling: min-max normalization and outlier capping.

use screener_core::error::StatsError;
use screener_core::types::ScoreTable;
use tracing::debug;

use crate::descriptive::{mean, sample_std_dev};

/// Default number of standard deviations kept by [`cap_outliers`].
pub const DEFAULT_OUTLIER_STD_MULTIPLIER: f64 = 3.0;

fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

/// Scale values into `[0, 1]` with `(x - min) / (max - min)`.
///
/// Empty values stay empty. A constant series maps to all zeros.
pub fn min_max(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let data = present(values);
    let Some(min) = data.iter().copied().reduce(f64::min) else {
        return values.to_vec();
    };
    let max = data.iter().copied().fold(min, f64::max);
    let range = max - min;

    values
        .iter()
        .map(|v| {
            v.map(|x| if range == 0.0 { 0.0 } else { (x - min) / range })
        })
        .collect()
}

/// Clamp values into `mean ± k·std` (sample standard deviation).
///
/// Series with fewer than two values are returned unchanged.
pub fn cap_outliers(values: &[Option<f64>], k: f64) -> Vec<Option<f64>> {
    let data = present(values);
    let (Some(m), Some(sd)) = (mean(&data), sample_std_dev(&data)) else {
        return values.to_vec();
    };
    let upper = m + k * sd;
    let lower = m - k * sd;

    values
        .iter()
        .map(|v| v.map(|x| x.clamp(lower, upper)))
        .collect()
}

/// Min-max normalize the named columns of a table.
///
/// With a `prefix`, results go to new `<prefix><column>` columns and the
/// originals are kept; without one the columns are replaced in place.
pub fn normalize_columns(
    table: &mut ScoreTable,
    columns: &[&str],
    prefix: Option<&str>,
) -> Result<(), StatsError> {
    for column in columns {
        if !table.has_column(column) {
            return Err(StatsError::UnknownColumn(column.to_string()));
        }
        let scaled = min_max(&table.column(column));
        let target = match prefix {
            Some(p) => format!("{}{}", p, column),
            None => column.to_string(),
        };
        table.set_column(&target, scaled)?;
    }
    Ok(())
}

/// Min-max normalize every numeric column in place.
///
/// Columns with at most one distinct value are left as they are.
pub fn normalize_table(table: &mut ScoreTable) -> Result<(), StatsError> {
    for column in table.numeric_columns() {
        let values = table.column(&column);
        let mut distinct = present(&values);
        distinct.sort_by(|a, b| a.total_cmp(b));
        distinct.dedup();
        if distinct.len() <= 1 {
            debug!(column = %column, "Not enough distinct values to scale column");
            continue;
        }
        table.set_column(&column, min_max(&values))?;
    }
    Ok(())
}

/// Cap outliers of one table column in place.
pub fn cap_column_outliers(table: &mut ScoreTable, column: &str, k: f64) -> Result<(), StatsError> {
    if !table.has_column(column) {
        return Err(StatsError::UnknownColumn(column.to_string()));
    }
    let capped = cap_outliers(&table.column(column), k);
    table.set_column(column, capped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_core::types::ScoreRow;

    #[test]
    fn test_min_max() {
        let scaled = min_max(&[Some(10.0), None, Some(20.0), Some(15.0)]);
        assert_eq!(scaled, vec![Some(0.0), None, Some(1.0), Some(0.5)]);
    }

    #[test]
    fn test_min_max_constant() {
        let scaled = min_max(&[Some(3.0), Some(3.0)]);
        assert_eq!(scaled, vec![Some(0.0), Some(0.0)]);
        assert_eq!(min_max(&[None, None]), vec![None, None]);
    }

    #[test]
    fn test_cap_outliers() {
        let mut values: Vec<Option<f64>> = (0..20).map(|_| Some(1.0)).collect();
        values.push(Some(100.0));

        let capped = cap_outliers(&values, DEFAULT_OUTLIER_STD_MULTIPLIER);
        let data: Vec<f64> = values.iter().flatten().copied().collect();
        let upper = mean(&data).unwrap() + 3.0 * sample_std_dev(&data).unwrap();

        assert!((capped[20].unwrap() - upper).abs() < 1e-9);
        assert_eq!(capped[0], Some(1.0));
    }

    #[test]
    fn test_cap_outliers_short_series() {
        assert_eq!(cap_outliers(&[Some(5.0)], 3.0), vec![Some(5.0)]);
    }

    #[test]
    fn test_normalize_table_skips_constant() {
        let mut table = ScoreTable::from_rows(vec![
            ScoreRow::new("AAA").with("a", 1.0).with("b", 7.0).with("name", "x"),
            ScoreRow::new("BBB").with("a", 3.0).with("b", 7.0).with("name", "y"),
        ]);
        normalize_table(&mut table).unwrap();

        assert_eq!(table.number("AAA", "a"), Some(0.0));
        assert_eq!(table.number("BBB", "a"), Some(1.0));
        assert_eq!(table.number("BBB", "b"), Some(7.0));
    }

    #[test]
    fn test_normalize_columns_with_prefix() {
        let mut table = ScoreTable::from_rows(vec![
            ScoreRow::new("AAA").with("a", 2.0),
            ScoreRow::new("BBB").with("a", 4.0),
        ]);
        normalize_columns(&mut table, &["a"], Some("norm_")).unwrap();

        assert_eq!(table.number("AAA", "a"), Some(2.0));
        assert_eq!(table.number("BBB", "norm_a"), Some(1.0));
        assert!(normalize_columns(&mut table, &["missing"], None).is_err());
    }
}
