//! Biggest winners: the strongest recent performers outside biotech,
//! enriched with analyst and fundamental context.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::types::ReportingPeriod;
use screener_screens::{
    future_revenue_growth, institutional_ownership, latest_ratios, lookback_returns,
    quarterly_revenue_growth, AnalystRatingsConfig, AnalystRatingsScreener, PriceTargetConfig,
    PriceTargetScreener, DEFAULT_REVENUE_LOOKBACK_QUARTERS,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::finder::{ensure_file_name, ensure_nonzero, ensure_positive_days, Finder, FinderConfig};
use crate::scoring::{ensure_columns, left_merge_all};
use crate::{FinderContext, FinderReport};

/// Columns of the written result, in order.
pub const WINNER_COLUMNS: [&str; 12] = [
    "lookback_return",
    "price_earnings_ratio",
    "avg_quarterly_revenue_growth",
    "avg_estimated_revenue_change",
    "avg_revenue_estimate_analysts",
    "bullish_count",
    "hold_count",
    "avg_price_target_change",
    "num_price_target_analysts",
    "investors_holding",
    "investors_holding_change",
    "investors_put_call_ratio",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiggestWinnerConfig {
    /// Calendar days the return is measured over
    pub lookback_days: i64,
    /// Winners kept for enrichment
    pub top_n: usize,
    pub price_target_lookback_days: i64,
    pub analyst_lookback_days: i64,
    pub generate_reports: bool,
    pub output_file: String,
}

impl Default for BiggestWinnerConfig {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            top_n: 10,
            price_target_lookback_days: 120,
            analyst_lookback_days: 90,
            generate_reports: true,
            output_file: "biggest_winner_results.csv".to_string(),
        }
    }
}

impl FinderConfig for BiggestWinnerConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_positive_days("lookback_days", self.lookback_days)?;
        ensure_nonzero("top_n", self.top_n)?;
        ensure_positive_days("price_target_lookback_days", self.price_target_lookback_days)?;
        ensure_positive_days("analyst_lookback_days", self.analyst_lookback_days)?;
        ensure_file_name("output_file", &self.output_file)
    }
}

pub struct BiggestWinnerFinder {
    config: BiggestWinnerConfig,
}

impl BiggestWinnerFinder {
    pub fn new(config: BiggestWinnerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Finder for BiggestWinnerFinder {
    fn name(&self) -> &str {
        "biggest-winner"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let settings = ctx.config();
        let as_of = ctx.as_of();
        let symbols = ctx
            .screener_universe(
                settings.universe.query(),
                Vec::new(),
                settings.universe.biotech_industries.clone(),
            )
            .await?;

        let prices = ctx.prices(&symbols, self.config.lookback_days).await;
        let mut table = lookback_returns(&prices, "lookback_return");
        table.head(self.config.top_n);
        let winners = table.symbols();
        info!(winners = winners.len(), "Top performers selected");

        let targets = PriceTargetScreener::new(PriceTargetConfig {
            lookback_days: self.config.price_target_lookback_days,
            min_analysts: 0,
        })
        .screen(&ctx.price_targets(&winners).await, as_of);
        let ratings = AnalystRatingsScreener::new(AnalystRatingsConfig {
            lookback_days: self.config.analyst_lookback_days,
            min_ratings_count: 0,
        })
        .screen(&ctx.grades(&winners).await, as_of);
        let revenue = quarterly_revenue_growth(
            &ctx.income_statements(&winners, ReportingPeriod::Quarter).await,
            DEFAULT_REVENUE_LOOKBACK_QUARTERS,
        );
        let estimates = future_revenue_growth(
            &ctx.estimates(&winners, ReportingPeriod::Annual).await,
            as_of,
        );
        let ownership = institutional_ownership(&ctx.ownership(&winners).await);
        let ratios = latest_ratios(&ctx.ratios(&winners, ReportingPeriod::Quarter).await);

        table = left_merge_all(&table, &[&ratings, &targets, &revenue, &estimates, &ownership, &ratios]);
        ensure_columns(&mut table, &WINNER_COLUMNS);
        table.fill_empty(0.0);
        table.select(&WINNER_COLUMNS);
        table.round(settings.thresholds.precision);

        let mut files = vec![ctx.write_results(&self.config.output_file, &table)?];
        if self.config.generate_reports {
            let reports = ctx.report_generator("biggest_winner")?;
            files.extend(reports.generate_all(&winners).await);
        }

        Ok(FinderReport::new(self.name(), table)
            .ranked_by("lookback_return")
            .with_files(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, days_ago, grades, history, listing, ratios};
    use screener_core::types::{CompanyOutlook, PriceTarget};
    use screener_data::InMemorySource;

    fn source() -> InMemorySource {
        let mut source = InMemorySource::new().with_listings(vec![
            listing("BIO", "Biotechnology"),
            listing("RUN", "Semiconductors"),
            listing("JOG", "Software"),
            listing("SAT", "Banks"),
        ]);
        for (symbol, last) in [("BIO", 300.0), ("RUN", 150.0), ("JOG", 110.0), ("SAT", 90.0)] {
            source = source.with_prices(history(symbol, &[100.0, 105.0, last]));
        }
        source
            .with_grades("RUN", grades(2, "Buy"))
            .with_price_targets("RUN", vec![PriceTarget::new(days_ago(5), 180.0, 150.0)])
            .with_ratios("RUN", ReportingPeriod::Quarter, vec![ratios(30, 0.3, 0.2, 35.0)])
            .with_outlook("RUN", CompanyOutlook::default())
    }

    #[tokio::test]
    async fn test_biggest_winners() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(source(), dir.path());
        let config = BiggestWinnerConfig {
            top_n: 2,
            ..Default::default()
        };

        let report = BiggestWinnerFinder::new(config).run(&ctx).await.unwrap();

        // BIO is excluded as biotech, SAT falls outside the top two
        assert_eq!(report.table.symbols(), vec!["RUN", "JOG"]);
        assert_eq!(report.table.columns().len(), WINNER_COLUMNS.len());
        assert_eq!(report.table.number("RUN", "lookback_return"), Some(50.0));
        assert_eq!(report.table.number("RUN", "bullish_count"), Some(2.0));
        assert_eq!(report.table.number("RUN", "avg_price_target_change"), Some(20.0));
        assert_eq!(report.table.number("RUN", "price_earnings_ratio"), Some(35.0));
        assert_eq!(report.table.number("JOG", "bullish_count"), Some(0.0));
        assert_eq!(report.table.number("JOG", "investors_holding"), Some(0.0));

        // Only RUN has an outlook to report on
        assert_eq!(report.files.len(), 2);
        assert!(report.files[1].ends_with("biggest_winner/RUN_report.html"));
    }

    #[test]
    fn test_config_validation() {
        assert!(BiggestWinnerConfig::default().validate().is_ok());
        let config = BiggestWinnerConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
