//! Analyst grade aggregation.

use chrono::{Duration, NaiveDate};
use screener_core::error::StatsError;
use screener_core::types::{AnalystGrade, ScoreRow, ScoreTable};
use serde::{Deserialize, Serialize};

use crate::config::ScreenConfig;
use crate::BySymbol;

/// Bucket of an analyst grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeClass {
    StrongBuy,
    Buy,
    Outperform,
    Hold,
    Underperform,
    Sell,
    StrongSell,
}

impl GradeClass {
    /// Classify a provider grade string. Unknown grades return `None`.
    pub fn classify(grade: &str) -> Option<Self> {
        match grade.trim() {
            "Strong Buy" => Some(GradeClass::StrongBuy),
            "Buy" | "Long-Term Buy" | "Conviction Buy" => Some(GradeClass::Buy),
            "Outperform" | "Perform" | "Overweight" => Some(GradeClass::Outperform),
            "Strong Sell" => Some(GradeClass::StrongSell),
            "Sell" | "Long-Term Sell" | "Conviction Sell" => Some(GradeClass::Sell),
            "Underperform" | "Underweight" => Some(GradeClass::Underperform),
            "Hold" | "Equal-Weight" => Some(GradeClass::Hold),
            _ => None,
        }
    }
}

/// Grade counts of one symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCounts {
    pub strong_buy: u32,
    pub buy: u32,
    pub outperform: u32,
    pub hold: u32,
    pub underperform: u32,
    pub sell: u32,
    pub strong_sell: u32,
    /// Every grade, including unclassified ones
    pub total: u32,
}

impl GradeCounts {
    /// Count grades dated within `lookback_days` of `as_of`.
    pub fn from_grades(grades: &[AnalystGrade], as_of: NaiveDate, lookback_days: i64) -> Self {
        let cutoff = as_of - Duration::days(lookback_days);
        let mut counts = Self::default();

        for grade in grades.iter().filter(|g| g.date >= cutoff) {
            match GradeClass::classify(&grade.new_grade) {
                Some(GradeClass::StrongBuy) => counts.strong_buy += 1,
                Some(GradeClass::Buy) => counts.buy += 1,
                Some(GradeClass::Outperform) => counts.outperform += 1,
                Some(GradeClass::Hold) => counts.hold += 1,
                Some(GradeClass::Underperform) => counts.underperform += 1,
                Some(GradeClass::Sell) => counts.sell += 1,
                Some(GradeClass::StrongSell) => counts.strong_sell += 1,
                None => {}
            }
            counts.total += 1;
        }

        counts
    }

    /// `2 * strong_buy + buy + outperform`
    pub fn bullish(&self) -> u32 {
        2 * self.strong_buy + self.buy + self.outperform
    }

    /// `2 * strong_sell + sell + underperform`
    pub fn bearish(&self) -> u32 {
        2 * self.strong_sell + self.sell + self.underperform
    }

    /// Bullish minus bearish.
    pub fn rating(&self) -> i64 {
        i64::from(self.bullish()) - i64::from(self.bearish())
    }

    /// Full breakdown as a table row.
    pub fn to_row(&self, symbol: &str) -> ScoreRow {
        ScoreRow::new(symbol)
            .with("strong_buy_count", self.strong_buy as usize)
            .with("buy_count", self.buy as usize)
            .with("outperform_count", self.outperform as usize)
            .with("sell_count", self.sell as usize)
            .with("strong_sell_count", self.strong_sell as usize)
            .with("underperform_count", self.underperform as usize)
            .with("hold_count", self.hold as usize)
            .with("bullish_count", self.bullish() as usize)
            .with("bearish_count", self.bearish() as usize)
            .with("total_grades_rating", self.rating())
            .with("total_ratings_count", self.total as usize)
    }
}

/// Configuration for the analyst ratings screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalystRatingsConfig {
    /// Only grades newer than this many days count
    pub lookback_days: i64,
    /// Minimum number of grades in the window
    pub min_ratings_count: u32,
}

impl Default for AnalystRatingsConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            min_ratings_count: 3,
        }
    }
}

impl ScreenConfig for AnalystRatingsConfig {
    fn validate(&self) -> Result<(), StatsError> {
        if self.lookback_days <= 0 {
            return Err(StatsError::InvalidParameter(
                "lookback_days must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Ranks symbols by the balance of recent bullish and bearish grades.
#[derive(Debug, Clone, Default)]
pub struct AnalystRatingsScreener {
    config: AnalystRatingsConfig,
}

impl AnalystRatingsScreener {
    /// Create a screener with the given configuration.
    pub fn new(config: AnalystRatingsConfig) -> Self {
        Self { config }
    }

    /// Aggregate grades, keep symbols with enough of them, sort by rating.
    ///
    /// Symbols without any grade in the window are dropped.
    pub fn screen(&self, grades: &BySymbol<Vec<AnalystGrade>>, as_of: NaiveDate) -> ScoreTable {
        let mut table = ScoreTable::new();

        for (symbol, rows) in grades {
            let counts = GradeCounts::from_grades(rows, as_of, self.config.lookback_days);
            if counts.total == 0 || counts.total < self.config.min_ratings_count {
                continue;
            }
            table.push(counts.to_row(symbol));
        }

        table.sort_by("total_grades_rating", true);
        table
    }
}

/// Compact rating columns used as a scoring input.
///
/// Writes `bullish_count`, `hold_count`, `bearish_count` and
/// `analyst_rating_score`. Every symbol gets a row, zero when it has no
/// recent grades.
pub fn analyst_rating_scores(
    grades: &BySymbol<Vec<AnalystGrade>>,
    as_of: NaiveDate,
    lookback_days: i64,
) -> ScoreTable {
    let mut table = ScoreTable::with_columns(&[
        "bullish_count",
        "hold_count",
        "bearish_count",
        "analyst_rating_score",
    ]);

    for (symbol, rows) in grades {
        let counts = GradeCounts::from_grades(rows, as_of, lookback_days);
        table.push(
            ScoreRow::new(symbol.clone())
                .with("bullish_count", counts.bullish() as usize)
                .with("hold_count", counts.hold as usize)
                .with("bearish_count", counts.bearish() as usize)
                .with("analyst_rating_score", counts.rating()),
        );
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn grade(days_ago: i64, label: &str) -> AnalystGrade {
        AnalystGrade::new(as_of() - Duration::days(days_ago), label)
    }

    #[test]
    fn test_classify() {
        assert_eq!(GradeClass::classify("Conviction Buy"), Some(GradeClass::Buy));
        assert_eq!(GradeClass::classify("Overweight"), Some(GradeClass::Outperform));
        assert_eq!(GradeClass::classify("Equal-Weight"), Some(GradeClass::Hold));
        assert_eq!(GradeClass::classify("Market Perform "), None);
    }

    #[test]
    fn test_counts_and_rating() {
        let grades = vec![
            grade(1, "Strong Buy"),
            grade(2, "Buy"),
            grade(3, "Overweight"),
            grade(4, "Outperform"),
            grade(5, "Underweight"),
            grade(6, "Hold"),
            grade(7, "Neutral"),
            grade(200, "Strong Sell"),
        ];
        let counts = GradeCounts::from_grades(&grades, as_of(), 60);

        assert_eq!(counts.total, 7);
        assert_eq!(counts.outperform, 2);
        assert_eq!(counts.bullish(), 5);
        assert_eq!(counts.bearish(), 1);
        assert_eq!(counts.rating(), 4);

        let row = counts.to_row("AAA");
        assert_eq!(row.number("outperform_count"), Some(2.0));
        assert_eq!(row.number("buy_count"), Some(1.0));
    }

    #[test]
    fn test_screener_min_count_and_order() {
        let mut grades = BySymbol::new();
        grades.insert("BULL".to_string(), vec![grade(1, "Strong Buy"), grade(2, "Buy"), grade(3, "Buy")]);
        grades.insert("BEAR".to_string(), vec![grade(1, "Sell"), grade(2, "Sell"), grade(3, "Hold")]);
        grades.insert("THIN".to_string(), vec![grade(1, "Strong Buy")]);

        let table = AnalystRatingsScreener::default().screen(&grades, as_of());

        assert_eq!(table.symbols(), vec!["BULL", "BEAR"]);
        assert_eq!(table.number("BULL", "total_grades_rating"), Some(4.0));
        assert_eq!(table.number("BEAR", "total_grades_rating"), Some(-2.0));
    }

    #[test]
    fn test_rating_scores_keep_empty_symbols() {
        let mut grades = BySymbol::new();
        grades.insert("OLD".to_string(), vec![grade(120, "Buy")]);
        grades.insert("NEW".to_string(), vec![grade(10, "Buy"), grade(11, "Sell")]);

        let table = analyst_rating_scores(&grades, as_of(), 60);

        assert_eq!(table.number("OLD", "analyst_rating_score"), Some(0.0));
        assert_eq!(table.number("NEW", "bullish_count"), Some(1.0));
        assert_eq!(table.number("NEW", "analyst_rating_score"), Some(0.0));
    }
}
