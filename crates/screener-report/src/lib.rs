//! Output writers.
//!
//! - Score tables as CSV (`symbol` first)
//! - Multi-sheet workbooks as a directory of CSVs plus a sheet index
//! - Per-company HTML reports rendered with MiniJinja

mod company;
mod table_csv;
mod workbook;

pub use company::{
    CompanyReport, CompanyReportGenerator, EstimateSummary, Section, REPORT_LOOKBACK_DAYS,
};
pub use table_csv::{read_table_csv, write_table_csv};
pub use workbook::{read_workbook, SheetEntry, WorkbookWriter, SHEET_INDEX};
