//! News and social media sentiment scores.

use chrono::{Duration, NaiveDate};
use screener_core::error::StatsError;
use screener_core::traits::Sentiment;
use screener_core::types::{SocialSentiment, ScoreRow, ScoreTable};
use screener_stats::{cap_column_outliers, mean, sample_std_dev};
use serde::{Deserialize, Serialize};

use crate::config::{ensure_non_negative, ScreenConfig};
use crate::BySymbol;

/// Articles fetched per symbol for news sentiment.
pub const NEWS_ARTICLE_LIMIT: usize = 5;

/// Mean and spread of classified news per symbol.
///
/// Each article scores `+p` when positive, `-p` when negative and `0` when
/// neutral. Writes `news_sentiment_score` (the mean, `0.0` without
/// articles) and `news_sentiment_std`.
pub fn news_sentiment(classified: &BySymbol<Vec<Sentiment>>) -> ScoreTable {
    let mut table = ScoreTable::with_columns(&["news_sentiment_score", "news_sentiment_std"]);

    for (symbol, results) in classified {
        let scores: Vec<f64> = results.iter().map(Sentiment::score).collect();
        table.push(
            ScoreRow::new(symbol.clone())
                .with("news_sentiment_score", mean(&scores).unwrap_or(0.0))
                .with("news_sentiment_std", sample_std_dev(&scores)),
        );
    }

    table
}

/// Configuration for the social sentiment factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialSentimentConfig {
    /// Only posts newer than this many days count
    pub lookback_days: i64,
    /// Outliers are capped at this many standard deviations
    pub outlier_std_multiplier: f64,
}

impl Default for SocialSentimentConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            outlier_std_multiplier: screener_stats::DEFAULT_OUTLIER_STD_MULTIPLIER,
        }
    }
}

impl ScreenConfig for SocialSentimentConfig {
    fn validate(&self) -> Result<(), StatsError> {
        if self.lookback_days <= 0 {
            return Err(StatsError::InvalidParameter(
                "lookback_days must be greater than 0".into(),
            ));
        }
        ensure_non_negative("outlier_std_multiplier", self.outlier_std_multiplier)
    }
}

/// Mean StockTwits sentiment over the lookback window.
///
/// Writes `social_sentiment_score`; symbols without recent data are skipped.
/// Outliers are capped.
pub fn social_sentiment(
    sentiment: &BySymbol<Vec<SocialSentiment>>,
    as_of: NaiveDate,
    config: &SocialSentimentConfig,
) -> Result<ScoreTable, StatsError> {
    let cutoff = as_of - Duration::days(config.lookback_days);
    let mut table = ScoreTable::with_columns(&["social_sentiment_score"]);

    for (symbol, rows) in sentiment {
        let values: Vec<f64> = rows
            .iter()
            .filter(|r| r.date >= cutoff)
            .filter_map(|r| r.stocktwits_sentiment)
            .collect();
        if let Some(score) = mean(&values) {
            table.push(ScoreRow::new(symbol.clone()).with("social_sentiment_score", score));
        }
    }

    cap_column_outliers(&mut table, "social_sentiment_score", config.outlier_std_multiplier)?;
    Ok(table)
}
