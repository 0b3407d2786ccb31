//! Score tables as CSV files.

use csv::{ReaderBuilder, Writer};
use screener_core::error::ReportError;
use screener_core::types::{Cell, ScoreRow, ScoreTable, SYMBOL_COLUMN};
use std::path::Path;
use tracing::debug;

/// Write a table with `symbol` as the first column.
///
/// Empty cells are written as empty fields; parent directories are created.
pub fn write_table_csv(path: &Path, table: &ScoreTable) -> Result<(), ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = Writer::from_path(path).map_err(|e| ReportError::Csv(e.to_string()))?;

    let mut header = vec![SYMBOL_COLUMN];
    header.extend(table.columns().iter().map(String::as_str));
    writer
        .write_record(&header)
        .map_err(|e| ReportError::Csv(e.to_string()))?;

    for row in table.rows() {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.symbol.clone());
        for column in table.columns() {
            record.push(row.get(column).map(Cell::to_string).unwrap_or_default());
        }
        writer
            .write_record(&record)
            .map_err(|e| ReportError::Csv(e.to_string()))?;
    }

    writer.flush()?;
    debug!(path = %path.display(), rows = table.len(), "Wrote table");
    Ok(())
}

/// Read a table written by [`write_table_csv`].
///
/// Fields parse as numbers, then `true`/`false` flags, then text; empty
/// fields stay empty.
pub fn read_table_csv(path: &Path) -> Result<ScoreTable, ReportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| ReportError::Csv(e.to_string()))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReportError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.first().map(String::as_str) != Some(SYMBOL_COLUMN) {
        return Err(ReportError::Csv(format!(
            "{}: first column must be '{}'",
            path.display(),
            SYMBOL_COLUMN
        )));
    }

    let columns: Vec<&str> = headers[1..].iter().map(String::as_str).collect();
    let mut table = ScoreTable::with_columns(&columns);

    for record in reader.records() {
        let record = record.map_err(|e| ReportError::Csv(e.to_string()))?;
        let mut fields = record.iter();
        let Some(symbol) = fields.next() else {
            continue;
        };

        let mut row = ScoreRow::new(symbol);
        for (column, field) in columns.iter().zip(fields) {
            row.set(column, parse_cell(field));
        }
        table.push(row);
    }

    Ok(table)
}

fn parse_cell(field: &str) -> Cell {
    let field = field.trim();
    if field.is_empty() {
        return Cell::Empty;
    }
    if let Ok(value) = field.parse::<f64>() {
        return Cell::from(value);
    }
    match field {
        "true" => Cell::Flag(true),
        "false" => Cell::Flag(false),
        _ => Cell::Text(field.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScoreTable {
        ScoreTable::from_rows([
            ScoreRow::new("AAPL")
                .with("bo_score", 0.8125)
                .with("company_name", "Apple Inc.")
                .with("is_etf", false),
            ScoreRow::new("MSFT").with("bo_score", 0.5).with("company_name", "Microsoft, Corp"),
        ])
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("bo_score.csv");

        write_table_csv(&path, &sample()).unwrap();
        let table = read_table_csv(&path).unwrap();

        assert_eq!(table.symbols(), vec!["AAPL", "MSFT"]);
        assert_eq!(table.columns(), &["bo_score", "company_name", "is_etf"]);
        assert_eq!(table.number("AAPL", "bo_score"), Some(0.8125));
        assert_eq!(table.get("MSFT").unwrap().text("company_name"), Some("Microsoft, Corp"));
        assert_eq!(table.cell("AAPL", "is_etf"), Some(&Cell::Flag(false)));
        assert_eq!(table.cell("MSFT", "is_etf"), Some(&Cell::Empty));
    }

    #[test]
    fn test_symbol_first_and_numbers_unquoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        write_table_csv(&path, &sample()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();

        assert_eq!(lines.next(), Some("symbol,bo_score,company_name,is_etf"));
        assert_eq!(lines.next(), Some("AAPL,0.8125,Apple Inc.,false"));
        assert_eq!(lines.next(), Some("MSFT,0.5,\"Microsoft, Corp\","));
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        write_table_csv(&path, &ScoreTable::with_columns(&["weighted_score"])).unwrap();
        let table = read_table_csv(&path).unwrap();

        assert!(table.is_empty());
        assert!(table.has_column("weighted_score"));
    }

    #[test]
    fn test_rejects_missing_symbol_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "ticker,score\nAAPL,1\n").unwrap();

        assert!(matches!(read_table_csv(&path), Err(ReportError::Csv(_))));
    }
}
