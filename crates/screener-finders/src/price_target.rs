//! Price target candidates: discounted large caps where analysts see the
//! most upside and expect earnings growth.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::types::ReportingPeriod;
use screener_data::MarketIndex;
use screener_screens::{
    analyst_rating_scores, EarningsEstimateConfig, EarningsEstimateScreener,
    FiftyTwoWeekLowConfig, FiftyTwoWeekLowScreener, PriceTargetConfig, PriceTargetScreener,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::finder::{
    ensure_file_name, ensure_finite, ensure_nonzero, ensure_positive_days, Finder, FinderConfig,
};
use crate::scoring::{inner_merge_all, keep_listed, normalized_weighted_score};
use crate::{FinderContext, FinderReport};

/// Weights of `weighted_score`, applied to min-max scaled columns.
pub const PRICE_TARGET_WEIGHTS: [(&str, f64); 5] = [
    ("price_drop_percent", 0.2),
    ("avg_price_target_change", 0.4),
    ("avg_eps_growth_quarter_percent", 0.1),
    ("avg_eps_growth_annual_percent", 0.1),
    ("analyst_rating_score", 0.2),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceTargetFinderConfig {
    pub price_history_days: i64,
    pub min_price_drop: f64,
    pub price_target_lookback_days: i64,
    pub min_price_target_analysts: usize,
    /// Future estimate periods averaged, for both quarters and years
    pub estimate_periods: usize,
    pub min_eps_growth: f64,
    pub analyst_lookback_days: i64,
    pub output_file: String,
}

impl Default for PriceTargetFinderConfig {
    fn default() -> Self {
        Self {
            price_history_days: 400,
            min_price_drop: 0.2,
            price_target_lookback_days: 60,
            min_price_target_analysts: 1,
            estimate_periods: 4,
            min_eps_growth: 0.05,
            analyst_lookback_days: 60,
            output_file: "candidates.csv".to_string(),
        }
    }
}

impl FinderConfig for PriceTargetFinderConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_positive_days("price_history_days", self.price_history_days)?;
        ensure_finite("min_price_drop", self.min_price_drop)?;
        ensure_positive_days("price_target_lookback_days", self.price_target_lookback_days)?;
        ensure_nonzero("estimate_periods", self.estimate_periods)?;
        ensure_finite("min_eps_growth", self.min_eps_growth)?;
        ensure_positive_days("analyst_lookback_days", self.analyst_lookback_days)?;
        ensure_file_name("output_file", &self.output_file)
    }
}

pub struct PriceTargetFinder {
    config: PriceTargetFinderConfig,
}

impl PriceTargetFinder {
    pub fn new(config: PriceTargetFinderConfig) -> Self {
        Self { config }
    }

    fn estimate_screener(&self) -> EarningsEstimateScreener {
        EarningsEstimateScreener::new(EarningsEstimateConfig {
            num_periods: self.config.estimate_periods,
            min_eps_growth: Some(self.config.min_eps_growth),
            min_analysts: None,
        })
    }
}

#[async_trait]
impl Finder for PriceTargetFinder {
    fn name(&self) -> &str {
        "price-target"
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

        let targets = PriceTargetScreener::new(PriceTargetConfig {
            lookback_days: self.config.price_target_lookback_days,
            min_analysts: self.config.min_price_target_analysts,
        })
        .screen(&ctx.price_targets(&symbols).await, as_of);

        let mut quarterly = self
            .estimate_screener()
            .screen(&ctx.estimates(&symbols, ReportingPeriod::Quarter).await, as_of);
        quarterly.rename_column("avg_eps_growth_percent", "avg_eps_growth_quarter_percent");
        quarterly.rename_column("avg_num_analysts", "avg_num_analysts_quarter");

        let mut annual = self
            .estimate_screener()
            .screen(&ctx.estimates(&symbols, ReportingPeriod::Annual).await, as_of);
        annual.rename_column("avg_eps_growth_percent", "avg_eps_growth_annual_percent");
        annual.rename_column("avg_num_analysts", "avg_num_analysts_annual");

        let ratings = analyst_rating_scores(
            &ctx.grades(&symbols).await,
            as_of,
            self.config.analyst_lookback_days,
        );

        let mut table = inner_merge_all(&drops, &[&targets, &quarterly, &annual, &ratings]);
        info!(candidates = table.len(), "Screens merged");
        if table.is_empty() {
            info!("No matching stocks found");
        } else {
            normalized_weighted_score(&mut table, "weighted_score", &PRICE_TARGET_WEIGHTS)?;
            table.sort_by("weighted_score", true);
            table.round(ctx.config().thresholds.precision);
        }

        let path = ctx.write_results(&self.config.output_file, &table)?;
        Ok(FinderReport::new(self.name(), table)
            .ranked_by("weighted_score")
            .with_files([path]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{as_of, context, days_ago, grades, listing, trending};
    use chrono::Duration;
    use screener_core::types::{EarningsEstimate, PriceTarget};
    use screener_data::InMemorySource;

    fn estimates(step_days: i64, eps: [f64; 4]) -> Vec<EarningsEstimate> {
        eps.iter()
            .enumerate()
            .map(|(i, e)| {
                EarningsEstimate::new(as_of() + Duration::days(step_days * (i as i64 + 1)), *e, 1e9, 6.0)
            })
            .collect()
    }

    fn with_candidate(source: InMemorySource, symbol: &str, end: f64, target: f64, eps: [f64; 4]) -> InMemorySource {
        source
            .with_prices(trending(symbol, 400, 100.0, end))
            .with_price_targets(symbol, vec![PriceTarget::new(days_ago(15), target, 50.0)])
            .with_estimates(symbol, ReportingPeriod::Quarter, estimates(90, eps))
            .with_estimates(symbol, ReportingPeriod::Annual, estimates(365, eps))
    }

    #[tokio::test]
    async fn test_price_target_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = InMemorySource::new().with_listings(vec![
            listing("UP", "Software"),
            listing("MID", "Software"),
            listing("NOEST", "Software"),
        ]);
        source = with_candidate(source, "UP", 50.0, 80.0, [1.0, 1.2, 1.4, 1.6]);
        source = with_candidate(source, "MID", 70.0, 60.0, [1.0, 1.05, 1.1, 1.15]);
        source = source
            .with_prices(trending("NOEST", 400, 100.0, 50.0))
            .with_price_targets("NOEST", vec![PriceTarget::new(days_ago(15), 90.0, 50.0)])
            .with_grades("UP", grades(3, "Outperform"));
        let ctx = context(source, dir.path());

        let report = PriceTargetFinder::new(PriceTargetFinderConfig::default())
            .run(&ctx)
            .await
            .unwrap();

        assert_eq!(report.table.symbols(), vec!["UP", "MID"]);
        assert!(report.table.has_column("avg_eps_growth_quarter_percent"));
        assert!(report.table.has_column("avg_num_analysts_annual"));
        assert!(!report.table.has_column("avg_eps_growth_percent"));
        assert_eq!(report.table.number("UP", "avg_price_target_change"), Some(60.0));
        assert_eq!(report.table.number("UP", "weighted_score"), Some(1.0));
        assert!(report.files[0].ends_with("candidates.csv"));
    }
}
