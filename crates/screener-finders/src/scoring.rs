//! Table plumbing shared by the finder pipelines.

use screener_core::error::StatsError;
use screener_core::types::{Join, ScoreRow, ScoreTable};
use screener_screens::BySymbol;
use screener_stats::normalize_columns;

/// Prefix of the temporary normalized columns.
const NORM_PREFIX: &str = "norm_";

/// One bare row per symbol, to left-join factor tables onto.
pub fn symbol_table(symbols: &[String]) -> ScoreTable {
    ScoreTable::from_rows(symbols.iter().map(|s| ScoreRow::new(s.clone())))
}

/// Left-join every part onto `base`, in order.
pub fn left_merge_all(base: &ScoreTable, parts: &[&ScoreTable]) -> ScoreTable {
    parts
        .iter()
        .fold(base.clone(), |merged, part| merged.merge(part, Join::Left))
}

/// Inner-join every part onto `base`, in order.
pub fn inner_merge_all(base: &ScoreTable, parts: &[&ScoreTable]) -> ScoreTable {
    parts
        .iter()
        .fold(base.clone(), |merged, part| merged.merge(part, Join::Inner))
}

/// Drop symbols that no longer appear in `table`, keeping their order.
pub fn keep_listed(symbols: &mut Vec<String>, table: &ScoreTable) {
    symbols.retain(|s| table.contains(s));
}

/// Drop map entries for symbols that are not in `symbols`.
pub fn restrict<T>(map: &mut BySymbol<T>, symbols: &[String]) {
    map.retain(|symbol, _| symbols.contains(symbol));
}

/// Add missing columns as empty cells.
///
/// A factor table without rows carries no columns, so after a merge the
/// column may be absent rather than empty.
pub fn ensure_columns(table: &mut ScoreTable, columns: &[&str]) {
    for column in columns {
        if !table.has_column(column) {
            table.map_column(column, |_| None);
        }
    }
}

/// Write `target = Σ weight · minmax(column)`; the raw columns are kept.
///
/// # Errors
/// `StatsError::UnknownColumn` when a weighted column is missing.
pub fn normalized_weighted_score(
    table: &mut ScoreTable,
    target: &str,
    weights: &[(&str, f64)],
) -> Result<(), StatsError> {
    let columns: Vec<&str> = weights.iter().map(|(column, _)| *column).collect();
    normalize_columns(table, &columns, Some(NORM_PREFIX))?;

    let scaled: Vec<String> = columns.iter().map(|c| format!("{}{}", NORM_PREFIX, c)).collect();
    let scaled_weights: Vec<(&str, f64)> = scaled
        .iter()
        .zip(weights)
        .map(|(column, (_, weight))| (column.as_str(), *weight))
        .collect();
    table.weighted_sum(target, &scaled_weights);
    table.drop_columns_with_prefix(NORM_PREFIX);
    Ok(())
}
