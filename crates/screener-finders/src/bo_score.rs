//! B/O score: weighted multi-factor ranking of the broad universe.
//!
//! Symbols pass through a chain of minimum-criteria filters (price,
//! quality, growth, momentum, analyst rating, dividend yield). Survivors
//! get news and social sentiment, every factor is min-max scaled, and the
//! weighted sum becomes `bo_score`.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::types::ReportingPeriod;
use screener_screens::{
    analyst_rating_scores, dividend_yield, growth_factor, momentum_factor, news_sentiment,
    quality_factor, social_sentiment, DividendYieldConfig, GrowthFactorConfig,
    MomentumFactorConfig, QualityFactorConfig, SocialSentimentConfig, TRADING_DAYS_PER_YEAR,
};
use screener_stats::normalize_table;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::finder::{ensure_file_name, ensure_nonzero, ensure_positive_days, Finder, FinderConfig};
use crate::scoring::{ensure_columns, keep_listed, left_merge_all, restrict, symbol_table};
use crate::{FinderContext, FinderReport};

/// Factor columns of the score, in output order.
pub const BO_SCORE_FACTORS: [&str; 7] = [
    "momentum_factor",
    "growth_factor",
    "quality_factor",
    "analyst_rating_score",
    "avg_dividend_yield",
    "news_sentiment_score",
    "social_sentiment_score",
];

/// Configuration of the B/O score run. Thresholds and weights come from
/// the application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoScoreConfig {
    /// Calendar days of daily prices fetched
    pub price_history_days: i64,
    /// Minimum number of bars a symbol needs
    pub min_bars: usize,
    /// Only analyst grades newer than this many days count
    pub analyst_lookback_days: i64,
    pub output_file: String,
}

impl Default for BoScoreConfig {
    fn default() -> Self {
        Self {
            price_history_days: 365 * 3,
            min_bars: TRADING_DAYS_PER_YEAR,
            analyst_lookback_days: 90,
            output_file: "bo_score.csv".to_string(),
        }
    }
}

impl FinderConfig for BoScoreConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_positive_days("price_history_days", self.price_history_days)?;
        ensure_nonzero("min_bars", self.min_bars)?;
        ensure_positive_days("analyst_lookback_days", self.analyst_lookback_days)?;
        ensure_file_name("output_file", &self.output_file)
    }
}

/// Ranks the screener universe by the weighted B/O score.
pub struct BoScoreFinder {
    config: BoScoreConfig,
}

impl BoScoreFinder {
    pub fn new(config: BoScoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoScoreConfig {
        &self.config
    }
}

#[async_trait]
impl Finder for BoScoreFinder {
    fn name(&self) -> &str {
        "bo-score"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let settings = ctx.config();
        let thresholds = &settings.thresholds;
        let as_of = ctx.as_of();
        let outliers = thresholds.outlier_std_multiplier;

        let mut symbols = ctx
            .screener_universe(settings.universe.query(), Vec::new(), Vec::new())
            .await?;

        let mut prices = ctx.prices(&symbols, self.config.price_history_days).await;
        prices.retain(|_, history| {
            history.len() >= self.config.min_bars
                && history.last().is_some_and(|bar| bar.close >= thresholds.min_price)
        });
        symbols.retain(|s| prices.contains_key(s));
        info!(symbols = symbols.len(), "Price filter applied");

        let quarterly = ctx.ratios(&symbols, ReportingPeriod::Quarter).await;
        let annual = ctx.ratios(&symbols, ReportingPeriod::Annual).await;
        let mut quality = quality_factor(
            &quarterly,
            &annual,
            &QualityFactorConfig {
                outlier_std_multiplier: outliers,
                ..Default::default()
            },
        )?;
        quality.retain_at_least("quality_factor", thresholds.min_quality_factor);
        keep_listed(&mut symbols, &quality);
        info!(symbols = symbols.len(), "Quality filter applied");

        let annual_growth = ctx.income_growth(&symbols, ReportingPeriod::Annual).await;
        let mut growth = growth_factor(
            &annual_growth,
            &GrowthFactorConfig {
                outlier_std_multiplier: outliers,
                ..Default::default()
            },
        )?;
        growth.retain_at_least("growth_factor", thresholds.min_growth_factor);
        keep_listed(&mut symbols, &growth);
        info!(symbols = symbols.len(), "Growth filter applied");

        restrict(&mut prices, &symbols);
        let mut momentum = momentum_factor(
            &prices,
            as_of,
            &MomentumFactorConfig {
                risk_free_rate: thresholds.risk_free_rate,
                outlier_std_multiplier: outliers,
                ..Default::default()
            },
        )?;
        momentum.retain_at_least("momentum_factor", thresholds.min_momentum_factor);
        keep_listed(&mut symbols, &momentum);
        info!(symbols = symbols.len(), "Momentum filter applied");

        let grades = ctx.grades(&symbols).await;
        let mut ratings = analyst_rating_scores(&grades, as_of, self.config.analyst_lookback_days);
        ratings.retain_at_least("analyst_rating_score", thresholds.min_analyst_rating);
        keep_listed(&mut symbols, &ratings);
        info!(symbols = symbols.len(), "Analyst rating filter applied");

        restrict(&mut prices, &symbols);
        let dividends = ctx.dividends(&symbols).await;
        let mut yields = dividend_yield(&dividends, &prices, as_of, &DividendYieldConfig::default());
        yields.retain_at_least("avg_dividend_yield", thresholds.min_dividend_yield);
        keep_listed(&mut symbols, &yields);
        info!(symbols = symbols.len(), "Dividend yield filter applied");

        let news = news_sentiment(&ctx.classified_news(&symbols).await);
        let social = social_sentiment(
            &ctx.social_sentiment(&symbols).await,
            as_of,
            &SocialSentimentConfig {
                outlier_std_multiplier: outliers,
                ..Default::default()
            },
        )?;

        let mut table = left_merge_all(
            &symbol_table(&symbols),
            &[&momentum, &growth, &quality, &ratings, &yields, &news, &social],
        );
        ensure_columns(&mut table, &BO_SCORE_FACTORS);
        table.select(&BO_SCORE_FACTORS);
        table.fill_empty(0.0);
        normalize_table(&mut table)?;

        let weights = &settings.weights;
        table.weighted_sum(
            "bo_score",
            &[
                ("momentum_factor", weights.momentum),
                ("growth_factor", weights.growth),
                ("quality_factor", weights.quality),
                ("analyst_rating_score", weights.analyst_ratings),
                ("avg_dividend_yield", weights.dividend_yield),
                ("news_sentiment_score", weights.news_sentiment),
                ("social_sentiment_score", weights.social_sentiment),
            ],
        );
        table.sort_by("bo_score", true);
        table.round(thresholds.precision);

        let path = ctx.write_results(&self.config.output_file, &table)?;
        Ok(FinderReport::new(self.name(), table)
            .ranked_by("bo_score")
            .with_files([path]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screener_core::error::ScreenerError;
    use crate::testing::{as_of, context, days_ago, grades, growth, listing, ratios, trending, Upbeat};
    use screener_core::types::{AnalystGrade, NewsArticle};
    use screener_screens::BySymbol;
    use screener_data::InMemorySource;
    use screener_report::read_table_csv;
    use std::sync::Arc;

    fn source() -> InMemorySource {
        let mut source = InMemorySource::new().with_listings(vec![
            listing("AAA", "Software"),
            listing("BBB", "Software"),
            listing("DDD", "Software"),
            listing("PENNY", "Software"),
        ]);
        for (symbol, start, end, roe, de, buys) in [
            ("AAA", 20.0, 60.0, 0.5, 0.2, 3),
            ("BBB", 40.0, 50.0, 0.3, 0.1, 1),
            ("DDD", 30.0, 45.0, 0.2, 2.0, 2),
        ] {
            source = source
                .with_prices(trending(symbol, 400, start, end))
                .with_ratios(symbol, ReportingPeriod::Quarter, vec![ratios(30, roe, de, 20.0)])
                .with_ratios(symbol, ReportingPeriod::Annual, vec![ratios(180, roe, de, 20.0)])
                .with_grades(symbol, grades(buys, "Buy"));
        }
        source
            .with_prices(trending("PENNY", 400, 3.0, 2.0))
            .with_income_growth("AAA", ReportingPeriod::Annual, vec![growth(180, 0.3, 0.2)])
            .with_income_growth("BBB", ReportingPeriod::Annual, vec![growth(180, 0.1, 0.1)])
            .with_income_growth("DDD", ReportingPeriod::Annual, vec![growth(180, 0.5, 0.5)])
    }

    #[tokio::test]
    async fn test_bo_score_ranking() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(source(), dir.path());

        let report = BoScoreFinder::new(BoScoreConfig::default()).run(&ctx).await.unwrap();

        // PENNY trades below the minimum price, DDD is too leveraged
        assert_eq!(report.table.symbols(), vec!["AAA", "BBB"]);
        // AAA leads on every scaled factor but the constant ones
        assert_eq!(report.table.number("AAA", "bo_score"), Some(0.75));
        assert_eq!(report.table.number("BBB", "bo_score"), Some(0.0));
        assert_eq!(report.table.number("AAA", "news_sentiment_score"), Some(0.0));

        let written = read_table_csv(&report.files[0]).unwrap();
        assert!(report.files[0].ends_with("results/bo_score.csv"));
        assert_eq!(written.symbols(), vec!["AAA", "BBB"]);
        assert!(written.has_column("bo_score"));
    }

    #[tokio::test]
    async fn test_bo_score_with_news_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let article = NewsArticle {
            symbol: Some("AAA".to_string()),
            title: "AAA beats estimates".to_string(),
            ..Default::default()
        };
        let source = source().with_news("AAA", vec![article]);
        let ctx = context(source, dir.path()).with_classifier(Arc::new(Upbeat));

        let report = BoScoreFinder::new(BoScoreConfig::default()).run(&ctx).await.unwrap();

        assert_eq!(report.table.number("AAA", "news_sentiment_score"), Some(1.0));
        assert_eq!(report.table.number("BBB", "news_sentiment_score"), Some(0.0));
        assert_eq!(report.table.number("AAA", "bo_score"), Some(0.78));
    }

    #[tokio::test]
    async fn test_empty_universe() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(InMemorySource::new(), dir.path());

        let result = BoScoreFinder::new(BoScoreConfig::default()).run(&ctx).await;

        assert!(matches!(
            result,
            Err(ScreenerError::Finder(FinderError::EmptyUniverse))
        ));
    }

    #[test]
    fn test_config_validation() {
        assert!(BoScoreConfig::default().validate().is_ok());

        let config = BoScoreConfig {
            min_bars: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BoScoreConfig {
            output_file: "out/bo.csv".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_grades_from_last_quarter_count() {
        let grades: BySymbol<Vec<AnalystGrade>> = [(
            "AAA".to_string(),
            vec![
                AnalystGrade::new(days_ago(75), "Buy"),
                AnalystGrade::new(days_ago(120), "Buy"),
            ],
        )]
        .into_iter()
        .collect();

        let table = analyst_rating_scores(&grades, as_of(), BoScoreConfig::default().analyst_lookback_days);

        assert_eq!(table.number("AAA", "analyst_rating_score"), Some(1.0));
    }
}
