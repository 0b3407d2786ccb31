//! Blue chip bargains: index heavyweights trading well below their high
//! with accelerating growth.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::types::ReportingPeriod;
use screener_data::MarketIndex;
use screener_screens::{
    analyst_rating_scores, FiftyTwoWeekLowConfig, FiftyTwoWeekLowScreener, GrowthScreener,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::finder::{ensure_file_name, ensure_finite, ensure_positive_days, Finder, FinderConfig};
use crate::scoring::{inner_merge_all, keep_listed};
use crate::{FinderContext, FinderReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueChipConfig {
    pub price_history_days: i64,
    /// Minimum drop from the 52-week high (0.2 = 20%)
    pub min_price_drop: f64,
    pub analyst_lookback_days: i64,
    pub output_file: String,
}

impl Default for BlueChipConfig {
    fn default() -> Self {
        Self {
            price_history_days: 400,
            min_price_drop: 0.2,
            analyst_lookback_days: 60,
            output_file: "blue_chip_bargain_candidates.csv".to_string(),
        }
    }
}

impl FinderConfig for BlueChipConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_positive_days("price_history_days", self.price_history_days)?;
        ensure_finite("min_price_drop", self.min_price_drop)?;
        ensure_positive_days("analyst_lookback_days", self.analyst_lookback_days)?;
        ensure_file_name("output_file", &self.output_file)
    }
}

pub struct BlueChipFinder {
    config: BlueChipConfig,
}

impl BlueChipFinder {
    pub fn new(config: BlueChipConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Finder for BlueChipFinder {
    fn name(&self) -> &str {
        "blue-chip-bargain"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let as_of = ctx.as_of();
        let mut symbols = ctx
            .index_universe(&[MarketIndex::Sp500, MarketIndex::Nasdaq100])
            .await?;

        let prices = ctx.prices(&symbols, self.config.price_history_days).await;
        let drops = FiftyTwoWeekLowScreener::new(FiftyTwoWeekLowConfig {
            min_price_drop: Some(self.config.min_price_drop),
            ..Default::default()
        })
        .screen(&prices, as_of);
        keep_listed(&mut symbols, &drops);
        info!(symbols = symbols.len(), "52-week low screen applied");

        let growth = GrowthScreener::default()
            .screen(&ctx.income_growth(&symbols, ReportingPeriod::Quarter).await);
        keep_listed(&mut symbols, &growth);
        info!(symbols = symbols.len(), "Growth screen applied");

        let ratings = analyst_rating_scores(
            &ctx.grades(&symbols).await,
            as_of,
            self.config.analyst_lookback_days,
        );

        let mut table = inner_merge_all(&drops, &[&growth, &ratings]);
        table.sort_by("price_drop_percent", true);
        table.round(ctx.config().thresholds.precision);

        let path = ctx.write_results(&self.config.output_file, &table)?;
        Ok(FinderReport::new(self.name(), table)
            .ranked_by("price_drop_percent")
            .with_files([path]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, grades, growth, listing, trending};
    use screener_data::InMemorySource;

    #[tokio::test]
    async fn test_blue_chip_bargains() {
        let dir = tempfile::tempdir().unwrap();
        let source = InMemorySource::new()
            .with_listings(vec![
                listing("MEGA", "Software"),
                listing("BIG", "Banks"),
                listing("SLOW", "Utilities"),
                listing("HIGH", "Software"),
            ])
            .with_prices(trending("MEGA", 400, 100.0, 75.0))
            .with_prices(trending("BIG", 400, 100.0, 60.0))
            .with_prices(trending("SLOW", 400, 100.0, 50.0))
            .with_prices(trending("HIGH", 400, 80.0, 100.0))
            .with_income_growth(
                "MEGA",
                ReportingPeriod::Quarter,
                vec![growth(90, 0.1, 0.1), growth(0, 0.15, 0.2)],
            )
            .with_income_growth(
                "BIG",
                ReportingPeriod::Quarter,
                vec![growth(90, 0.11, 0.12), growth(0, 0.2, 0.3)],
            )
            .with_income_growth(
                "SLOW",
                ReportingPeriod::Quarter,
                vec![growth(90, 0.3, 0.3), growth(0, 0.2, 0.2)],
            )
            .with_grades("MEGA", grades(1, "Strong Buy"));
        let ctx = context(source, dir.path());

        let report = BlueChipFinder::new(BlueChipConfig::default()).run(&ctx).await.unwrap();

        // SLOW is decelerating, HIGH trades at its high
        assert_eq!(report.table.symbols(), vec!["BIG", "MEGA"]);
        assert_eq!(report.table.number("BIG", "price_drop_percent"), Some(0.4));
        assert_eq!(report.table.number("MEGA", "analyst_rating_score"), Some(2.0));
        assert!(report.files[0].ends_with("blue_chip_bargain_candidates.csv"));
    }
}
