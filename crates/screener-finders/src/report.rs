//! Finder run results.

use screener_core::types::ScoreTable;
use serde::Serialize;
use std::path::PathBuf;

/// Rows shown in the console summary.
const SUMMARY_ROWS: usize = 10;

/// Outcome of a finder run.
#[derive(Debug, Clone, Serialize)]
pub struct FinderReport {
    /// Registry key of the finder
    pub finder: String,
    /// Ranked candidates
    pub table: ScoreTable,
    /// Column the table is ranked by
    pub score_column: Option<String>,
    /// Files written by the run
    pub files: Vec<PathBuf>,
}

impl FinderReport {
    pub fn new(finder: &str, table: ScoreTable) -> Self {
        Self {
            finder: finder.to_string(),
            table,
            score_column: None,
            files: Vec::new(),
        }
    }

    pub fn ranked_by(mut self, column: &str) -> Self {
        self.score_column = Some(column.to_string());
        self
    }

    pub fn with_files(mut self, files: impl IntoIterator<Item = PathBuf>) -> Self {
        self.files.extend(files);
        self
    }

    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str(&format!("{:^59}\n", format!("{} RESULTS", self.finder.to_uppercase())));
        s.push_str("═══════════════════════════════════════════════════════════\n\n");

        s.push_str("OVERVIEW\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Candidates:          {}\n", self.table.len()));
        s.push_str(&format!("  Columns:             {}\n", self.table.columns().len()));
        if let Some(column) = &self.score_column {
            s.push_str(&format!("  Ranked By:           {}\n", column));
        }
        s.push('\n');

        if !self.table.is_empty() {
            s.push_str("TOP CANDIDATES\n");
            s.push_str("───────────────────────────────────────────────────────────\n");
            for (rank, row) in self.table.rows().iter().take(SUMMARY_ROWS).enumerate() {
                let score = self
                    .score_column
                    .as_deref()
                    .and_then(|c| row.number(c))
                    .map(|v| format!("{:.4}", v))
                    .unwrap_or_default();
                s.push_str(&format!("  {:>2}. {:<10} {:>14}\n", rank + 1, row.symbol, score));
            }
            s.push('\n');
        }

        if !self.files.is_empty() {
            s.push_str("FILES\n");
            s.push_str("───────────────────────────────────────────────────────────\n");
            for file in &self.files {
                s.push_str(&format!("  {}\n", file.display()));
            }
            s.push('\n');
        }

        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
