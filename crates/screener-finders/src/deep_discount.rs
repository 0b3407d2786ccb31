//! Deep discount growth: large caps far below their 52-week high that
//! still grow and are expected to keep growing earnings.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::types::ReportingPeriod;
use screener_data::MarketIndex;
use screener_screens::{
    analyst_rating_scores, EarningsEstimateConfig, EarningsEstimateScreener,
    FiftyTwoWeekLowConfig, FiftyTwoWeekLowScreener, GrowthScreener, GrowthScreenerConfig,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::finder::{ensure_file_name, ensure_finite, ensure_positive_days, Finder, FinderConfig};
use crate::scoring::{inner_merge_all, keep_listed, normalized_weighted_score};
use crate::{FinderContext, FinderReport};

/// Weights of `weighted_score`, applied to min-max scaled columns.
pub const DEEP_DISCOUNT_WEIGHTS: [(&str, f64); 5] = [
    ("price_drop_percent", 0.3),
    ("avg_eps_growth_percent", 0.3),
    ("last_quarter_revenue_growth", 0.1),
    ("last_quarter_earnings_growth", 0.1),
    ("analyst_rating_score", 0.2),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepDiscountConfig {
    pub price_history_days: i64,
    /// Minimum drop from the 52-week high (0.5 = 50%)
    pub min_price_drop: f64,
    pub min_revenue_growth: f64,
    pub min_earnings_growth: f64,
    /// Minimum expected EPS growth over the next four quarters
    pub min_eps_growth: f64,
    pub min_eps_analysts: f64,
    pub analyst_lookback_days: i64,
    pub output_file: String,
}

impl Default for DeepDiscountConfig {
    fn default() -> Self {
        Self {
            price_history_days: 400,
            min_price_drop: 0.5,
            min_revenue_growth: 0.1,
            min_earnings_growth: 0.1,
            min_eps_growth: 0.1,
            min_eps_analysts: 3.0,
            analyst_lookback_days: 60,
            output_file: "deep_discount_growth_candidates.csv".to_string(),
        }
    }
}

impl FinderConfig for DeepDiscountConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_positive_days("price_history_days", self.price_history_days)?;
        ensure_finite("min_price_drop", self.min_price_drop)?;
        ensure_finite("min_revenue_growth", self.min_revenue_growth)?;
        ensure_finite("min_earnings_growth", self.min_earnings_growth)?;
        ensure_finite("min_eps_growth", self.min_eps_growth)?;
        ensure_finite("min_eps_analysts", self.min_eps_analysts)?;
        ensure_positive_days("analyst_lookback_days", self.analyst_lookback_days)?;
        ensure_file_name("output_file", &self.output_file)
    }
}

pub struct DeepDiscountFinder {
    config: DeepDiscountConfig,
}

impl DeepDiscountFinder {
    pub fn new(config: DeepDiscountConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Finder for DeepDiscountFinder {
    fn name(&self) -> &str {
        "deep-discount-growth"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let as_of = ctx.as_of();
        let mut symbols = ctx.index_universe(&[MarketIndex::Russell1000]).await?;

        let prices = ctx.prices(&symbols, self.config.price_history_days).await;
        let drops = FiftyTwoWeekLowScreener::new(FiftyTwoWeekLowConfig {
            min_price_drop: Some(self.config.min_price_drop),
            ..Default::default()
        })
        .screen(&prices, as_of);
        keep_listed(&mut symbols, &drops);
        info!(symbols = symbols.len(), "52-week low screen applied");

        let growth = GrowthScreener::new(GrowthScreenerConfig {
            min_revenue_growth: self.config.min_revenue_growth,
            min_earnings_growth: self.config.min_earnings_growth,
            ..Default::default()
        })
        .screen(&ctx.income_growth(&symbols, ReportingPeriod::Quarter).await);
        keep_listed(&mut symbols, &growth);
        info!(symbols = symbols.len(), "Growth screen applied");

        let eps = EarningsEstimateScreener::new(EarningsEstimateConfig {
            min_eps_growth: Some(self.config.min_eps_growth),
            min_analysts: Some(self.config.min_eps_analysts),
            ..Default::default()
        })
        .screen(&ctx.estimates(&symbols, ReportingPeriod::Quarter).await, as_of);
        keep_listed(&mut symbols, &eps);
        info!(symbols = symbols.len(), "Earnings estimate screen applied");

        let ratings = analyst_rating_scores(
            &ctx.grades(&symbols).await,
            as_of,
            self.config.analyst_lookback_days,
        );

        let mut table = inner_merge_all(&drops, &[&growth, &eps, &ratings]);
        normalized_weighted_score(&mut table, "weighted_score", &DEEP_DISCOUNT_WEIGHTS)?;
        table.sort_by("weighted_score", true);
        table.round(ctx.config().thresholds.precision);

        let path = ctx.write_results(&self.config.output_file, &table)?;
        Ok(FinderReport::new(self.name(), table)
            .ranked_by("weighted_score")
            .with_files([path]))
    }
}
