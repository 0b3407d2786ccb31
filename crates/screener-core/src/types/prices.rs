//! Daily price data types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::flexible_date;

/// One daily price row.
///
/// The provider's "line" series only carries `date` and `close`; the other
/// fields then default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Trading day
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,
    /// Opening price
    #[serde(default)]
    pub open: f64,
    /// Highest price
    #[serde(default)]
    pub high: f64,
    /// Lowest price
    #[serde(default)]
    pub low: f64,
    /// Closing price
    pub close: f64,
    /// Trading volume
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    /// Create a new bar.
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Create a close-only bar.
    pub fn close_only(date: NaiveDate, close: f64) -> Self {
        Self::new(date, close, close, close, close, 0.0)
    }

    /// Calculate the bar's range (high - low).
    #[inline]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }
}

/// Daily price history for one symbol, ordered oldest to newest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    /// Symbol identifier
    pub symbol: String,
    bars: Vec<Bar>,
}

impl PriceHistory {
    /// Create a history from bars in any order. Duplicate dates keep the last bar given.
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        bars.reverse();
        bars.dedup_by_key(|b| b.date);
        bars.reverse();
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    /// Get the number of bars.
    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Check if the history is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Get all bars as a slice.
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    /// Get the first (oldest) bar.
    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    /// Get the last (newest) bar.
    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Close `n` bars from the end, where `n = 1` is the newest close.
    pub fn close_from_end(&self, n: usize) -> Option<f64> {
        if n == 0 || n > self.bars.len() {
            return None;
        }
        Some(self.bars[self.bars.len() - n].close)
    }

    /// Highest close in the history.
    pub fn max_close(&self) -> Option<f64> {
        self.bars.iter().map(|b| b.close).reduce(f64::max)
    }

    /// Extract close prices as a vector.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Bars dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> PriceHistory {
        PriceHistory {
            symbol: self.symbol.clone(),
            bars: self.bars.iter().filter(|b| b.date >= start).copied().collect(),
        }
    }

    /// Bars dated within `[start, end]`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> PriceHistory {
        PriceHistory {
            symbol: self.symbol.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .copied()
                .collect(),
        }
    }

    /// Get an iterator over the bars.
    pub fn iter(&self) -> impl Iterator<Item = &Bar> {
        self.bars.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_history_sorts_and_dedups() {
        let history = PriceHistory::new(
            "AAPL",
            vec![
                Bar::close_only(day(3), 103.0),
                Bar::close_only(day(1), 101.0),
                Bar::close_only(day(2), 102.0),
                Bar::close_only(day(2), 102.5),
            ],
        );

        assert_eq!(history.len(), 3);
        assert_eq!(history.first().unwrap().date, day(1));
        assert_eq!(history.closes(), vec![101.0, 102.5, 103.0]);
    }

    #[test]
    fn test_close_from_end() {
        let history = PriceHistory::new(
            "AAPL",
            (1..=5).map(|d| Bar::close_only(day(d), d as f64)).collect(),
        );

        assert_eq!(history.close_from_end(1), Some(5.0));
        assert_eq!(history.close_from_end(2), Some(4.0));
        assert_eq!(history.close_from_end(5), Some(1.0));
        assert_eq!(history.close_from_end(6), None);
        assert_eq!(history.close_from_end(0), None);
    }

    #[test]
    fn test_since_and_max() {
        let history = PriceHistory::new(
            "MSFT",
            vec![
                Bar::close_only(day(1), 10.0),
                Bar::close_only(day(2), 30.0),
                Bar::close_only(day(3), 20.0),
            ],
        );

        assert!((history.max_close().unwrap() - 30.0).abs() < 0.001);
        assert_eq!(history.since(day(2)).len(), 2);
        assert_eq!(history.between(day(2), day(2)).closes(), vec![30.0]);
    }

    #[test]
    fn test_line_series_deserialize() {
        let json = r#"{"date": "2024-01-05", "close": 187.5}"#;
        let bar: Bar = serde_json::from_str(json).unwrap();
        assert_eq!(bar.date, day(5));
        assert!((bar.close - 187.5).abs() < 0.001);
        assert_eq!(bar.volume, 0.0);
    }
}
