//! Company outlook workbooks: section scoring and the multi-sheet output
//! shared by the value, penny stock and overvalued finders.

use screener_core::error::{ScreenerError, StatsError};
use screener_core::types::ScoreTable;
use screener_report::WorkbookWriter;
use screener_screens::{final_score, OutlookSections, SectionScore};
use std::path::PathBuf;

use crate::scoring::ensure_columns;
use crate::FinderContext;

/// Score a section that has rows; an empty section still gets the column.
pub fn score_section(table: &mut ScoreTable, score: &SectionScore) -> Result<(), StatsError> {
    if !table.is_empty() {
        score.apply(table)?;
    }
    ensure_columns(table, &[score.target]);
    Ok(())
}

/// Final score over `parts`, paired in order with `(column, weight)`.
pub fn weighted_final_score(parts: &[&ScoreTable], weights: &[(&str, f64)]) -> ScoreTable {
    let weighted: Vec<(&ScoreTable, &str, f64)> = parts
        .iter()
        .zip(weights)
        .map(|(table, (column, weight))| (*table, *column, *weight))
        .collect();
    final_score(&weighted)
}

/// Profile, scores, news and statement sheets, in workbook order.
pub fn section_sheets(sections: OutlookSections, scores: &ScoreTable) -> Vec<(&'static str, ScoreTable)> {
    vec![
        ("Profile", sections.profile),
        ("Scores", scores.clone()),
        ("News Headlines", sections.news),
        ("Ratios", sections.ratios),
        ("Quarterly Income", sections.quarterly_income),
        ("Annual Income", sections.annual_income),
        ("Quarterly Balance Sheet", sections.quarterly_balance_sheet),
        ("Annual Balance Sheet", sections.annual_balance_sheet),
        ("Quarterly Cashflow", sections.quarterly_cashflow),
        ("Annual Cashflow", sections.annual_cashflow),
    ]
}

/// Write `<prefix>_<as-of date>` under the results directory.
///
/// Every sheet is reordered to follow `scores`.
pub fn write_workbook(
    ctx: &FinderContext,
    prefix: &str,
    scores: &ScoreTable,
    sheets: Vec<(&str, ScoreTable)>,
) -> Result<PathBuf, ScreenerError> {
    let name = format!("{}_{}", prefix, ctx.as_of().format("%Y-%m-%d"));
    let mut workbook = WorkbookWriter::create(&ctx.config().paths.results_dir, &name)?;
    for (title, mut table) in sheets {
        table.align_to(scores);
        workbook.add_sheet(title, &table)?;
    }
    Ok(workbook.finish()?)
}
