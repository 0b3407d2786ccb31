//! Multi-sheet workbooks.
//!
//! A workbook is a directory `<name>/` holding one CSV per sheet and a
//! `sheets.json` index that keeps the sheet order and titles.

use screener_core::error::ReportError;
use screener_core::types::ScoreTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::table_csv::{read_table_csv, write_table_csv};

/// Name of the sheet index inside a workbook directory.
pub const SHEET_INDEX: &str = "sheets.json";

/// One entry of the sheet index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetEntry {
    pub title: String,
    pub file: String,
}

/// Writes sheets into a workbook directory.
pub struct WorkbookWriter {
    dir: PathBuf,
    sheets: Vec<SheetEntry>,
}

impl WorkbookWriter {
    /// Start a workbook at `<root>/<name>/`, replacing an older one.
    pub fn create(root: &Path, name: &str) -> Result<Self, ReportError> {
        let dir = root.join(name);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            sheets: Vec::new(),
        })
    }

    /// Add a sheet. Titles must be unique within the workbook.
    pub fn add_sheet(&mut self, title: &str, table: &ScoreTable) -> Result<(), ReportError> {
        if self.sheets.iter().any(|s| s.title == title) {
            return Err(ReportError::Internal(format!("duplicate sheet '{}'", title)));
        }

        let file = format!("{:02}_{}.csv", self.sheets.len() + 1, sheet_file_stem(title));
        write_table_csv(&self.dir.join(&file), table)?;
        self.sheets.push(SheetEntry {
            title: title.to_string(),
            file,
        });
        Ok(())
    }

    /// Write the sheet index and return the workbook directory.
    pub fn finish(self) -> Result<PathBuf, ReportError> {
        let index = serde_json::to_string_pretty(&self.sheets)
            .map_err(|e| ReportError::Internal(e.to_string()))?;
        fs::write(self.dir.join(SHEET_INDEX), index)?;

        info!(path = %self.dir.display(), sheets = self.sheets.len(), "Workbook written");
        Ok(self.dir)
    }
}

/// Read every sheet of a workbook, in index order.
pub fn read_workbook(dir: &Path) -> Result<Vec<(String, ScoreTable)>, ReportError> {
    let index = fs::read_to_string(dir.join(SHEET_INDEX))?;
    let entries: Vec<SheetEntry> =
        serde_json::from_str(&index).map_err(|e| ReportError::Internal(e.to_string()))?;

    entries
        .into_iter()
        .map(|entry| Ok((entry.title, read_table_csv(&dir.join(&entry.file))?)))
        .collect()
}

fn sheet_file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    stem.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_core::types::ScoreRow;

    #[test]
    fn test_workbook_keeps_sheet_order() {
        let dir = tempfile::tempdir().unwrap();
        let scores = ScoreTable::from_rows([
            ScoreRow::new("KO").with("final_score", 0.9),
            ScoreRow::new("PEP").with("final_score", 0.4),
        ]);
        let profile = ScoreTable::from_rows([
            ScoreRow::new("KO").with("company_name", "Coca-Cola"),
            ScoreRow::new("PEP").with("company_name", "PepsiCo"),
        ]);

        let mut writer = WorkbookWriter::create(dir.path(), "value_stocks").unwrap();
        writer.add_sheet("Profile", &profile).unwrap();
        writer.add_sheet("Scores", &scores).unwrap();
        writer.add_sheet("Quarterly Balance Sheet", &ScoreTable::new()).unwrap();
        let path = writer.finish().unwrap();

        assert!(path.join("03_quarterly_balance_sheet.csv").exists());
        let sheets = read_workbook(&path).unwrap();
        let titles: Vec<&str> = sheets.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(titles, vec!["Profile", "Scores", "Quarterly Balance Sheet"]);
        assert_eq!(sheets[1].1.number("KO", "final_score"), Some(0.9));
    }

    #[test]
    fn test_duplicate_sheet_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = WorkbookWriter::create(dir.path(), "book").unwrap();
        writer.add_sheet("Scores", &ScoreTable::new()).unwrap();
        assert!(writer.add_sheet("Scores", &ScoreTable::new()).is_err());
    }

    #[test]
    fn test_create_replaces_old_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = WorkbookWriter::create(dir.path(), "book").unwrap();
        writer.add_sheet("Old", &ScoreTable::new()).unwrap();
        writer.finish().unwrap();

        let writer = WorkbookWriter::create(dir.path(), "book").unwrap();
        let path = writer.finish().unwrap();
        assert!(!path.join("01_old.csv").exists());
        assert!(read_workbook(&path).unwrap().is_empty());
    }
}
