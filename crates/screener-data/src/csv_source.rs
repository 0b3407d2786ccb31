//! CSV price files.

use csv::{ReaderBuilder, Writer};
use screener_core::error::DataError;
use screener_core::types::dates::parse_flexible_date;
use screener_core::types::{Bar, PriceHistory};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CSV record format.
#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "Date", alias = "date", alias = "timestamp", alias = "Timestamp")]
    date: String,
    #[serde(alias = "Open", alias = "open", default)]
    open: f64,
    #[serde(alias = "High", alias = "high", default)]
    high: f64,
    #[serde(alias = "Low", alias = "low", default)]
    low: f64,
    #[serde(alias = "Close", alias = "close", alias = "Adj Close")]
    close: f64,
    #[serde(alias = "Volume", alias = "volume", default)]
    volume: f64,
}

/// Reads and writes daily price histories as CSV files.
pub struct CsvPriceSource {
    dir: PathBuf,
}

impl CsvPriceSource {
    /// Create a source over a directory of `<SYMBOL>.csv` files.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of a symbol's file.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", symbol))
    }

    /// Load a symbol's history.
    pub fn load(&self, symbol: &str) -> Result<PriceHistory, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound(symbol.to_string()));
        }
        load_price_file(&path, symbol)
    }

    /// Write a history to `<dir>/<SYMBOL>.csv`.
    pub fn save(&self, history: &PriceHistory) -> Result<PathBuf, DataError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| DataError::Internal(e.to_string()))?;
        let path = self.path_for(&history.symbol);

        let mut writer = Writer::from_path(&path).map_err(|e| DataError::Internal(e.to_string()))?;
        writer
            .write_record(["date", "open", "high", "low", "close", "volume"])
            .map_err(|e| DataError::Internal(e.to_string()))?;
        for bar in history.iter() {
            writer
                .write_record([
                    bar.date.format("%Y-%m-%d").to_string(),
                    bar.open.to_string(),
                    bar.high.to_string(),
                    bar.low.to_string(),
                    bar.close.to_string(),
                    bar.volume.to_string(),
                ])
                .map_err(|e| DataError::Internal(e.to_string()))?;
        }
        writer.flush().map_err(|e| DataError::Internal(e.to_string()))?;
        Ok(path)
    }
}

/// Load a price file with flexible headers and date formats.
pub fn load_price_file(path: &Path, symbol: &str) -> Result<PriceHistory, DataError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| DataError::ParseError(e.to_string()))?;

    let mut bars = Vec::new();

    for result in reader.deserialize() {
        let record: CsvRecord = result.map_err(|e| DataError::ParseError(e.to_string()))?;
        let date = parse_flexible_date(&record.date)
            .ok_or_else(|| DataError::ParseError(format!("Could not parse date: {}", record.date)))?;

        bars.push(Bar::new(
            date,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }

    if bars.is_empty() {
        return Err(DataError::NoDataAvailable);
    }

    Ok(PriceHistory::new(symbol, bars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let source = CsvPriceSource::new(dir.path());
        let day = |d| NaiveDate::from_ymd_opt(2024, 2, d).unwrap();
        let history = PriceHistory::new(
            "MSFT",
            vec![Bar::close_only(day(2), 410.5), Bar::close_only(day(1), 405.0)],
        );

        source.save(&history).unwrap();
        let loaded = source.load("MSFT").unwrap();
        assert_eq!(loaded, history);
        assert!(matches!(source.load("NOPE"), Err(DataError::SymbolNotFound(_))));
    }

    #[test]
    fn test_load_mixed_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.csv");
        std::fs::write(
            &path,
            "Date,Open,High,Low,Adj Close,Volume\n2024-01-16,1,2,0.5,1.5,100\n1705312800,1,2,0.5,1.4,90\n",
        )
        .unwrap();

        let history = load_price_file(&path, "X").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().close, 1.5);
    }
}
