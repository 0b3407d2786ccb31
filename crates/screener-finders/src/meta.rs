//! Meta screener: biotech names with strong price target upside,
//! revenue momentum and reasonable valuation.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::types::ReportingPeriod;
use screener_screens::{
    future_revenue_growth, institutional_ownership, latest_ratios, quarterly_revenue_growth,
    AnalystRatingsConfig, AnalystRatingsScreener, PriceTargetConfig, PriceTargetScreener,
    DEFAULT_REVENUE_LOOKBACK_QUARTERS,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::finder::{ensure_file_name, ensure_finite, ensure_nonzero, ensure_positive_days, Finder, FinderConfig};
use crate::ranking::{economic_moat_scores, rank_candidates};
use crate::scoring::{ensure_columns, keep_listed, left_merge_all, normalized_weighted_score};
use crate::{FinderContext, FinderReport};

/// Stand-in for a zero P/E before inverting it.
const ZERO_PE_REPLACEMENT: f64 = 1e-6;

/// Weights of `weighted_score`, applied to min-max scaled columns.
pub const META_WEIGHTS: [(&str, f64); 5] = [
    ("avg_price_target_change", 0.4),
    ("avg_quarterly_revenue_growth", 0.2),
    ("total_grades_rating", 0.1),
    ("avg_estimated_revenue_change", 0.2),
    ("inverted_price_earnings_ratio", 0.1),
];

/// Merged columns that must exist even when a source returned nothing.
const MERGED_COLUMNS: [&str; 11] = [
    "total_grades_rating",
    "bullish_count",
    "hold_count",
    "avg_quarterly_revenue_growth",
    "avg_estimated_revenue_change",
    "avg_revenue_estimate_analysts",
    "investors_holding",
    "investors_holding_change",
    "investors_put_call_ratio",
    "institutional_investor_score",
    "price_earnings_ratio",
];

/// Columns of the written result, in order.
const OUTPUT_COLUMNS: [&str; 16] = [
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
    "institutional_investor_score",
    "weighted_score",
    "llm_rank",
    "reasoning",
    "economic_moat_score",
];

/// Configuration of the meta screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaFinderConfig {
    /// Industries of the universe; `None` uses the configured biotech list
    pub industries: Option<Vec<String>>,
    pub min_price_target_analysts: usize,
    pub price_target_lookback_days: i64,
    /// Minimum average upside of recent price targets, in percent
    pub min_avg_price_target_change: f64,
    pub analyst_lookback_days: i64,
    /// Minimum mean quarter-over-quarter revenue growth, in percent
    pub min_quarterly_revenue_growth: f64,
    pub min_bullish_count: f64,
    /// Put/call ratio must stay below this
    pub max_put_call_ratio: f64,
    pub max_price_earnings_ratio: f64,
    /// Candidates kept after scoring
    pub top_n: usize,
    /// Write an HTML report per candidate
    pub generate_reports: bool,
    pub output_file: String,
}

impl Default for MetaFinderConfig {
    fn default() -> Self {
        Self {
            industries: None,
            min_price_target_analysts: 2,
            price_target_lookback_days: 120,
            min_avg_price_target_change: 28.0,
            analyst_lookback_days: 90,
            min_quarterly_revenue_growth: 2.0,
            min_bullish_count: 0.0,
            max_put_call_ratio: 1.0,
            max_price_earnings_ratio: 50.0,
            top_n: 50,
            generate_reports: true,
            output_file: "meta_screener_results.csv".to_string(),
        }
    }
}

impl FinderConfig for MetaFinderConfig {
    fn validate(&self) -> Result<(), FinderError> {
        if self.industries.as_ref().is_some_and(|i| i.is_empty()) {
            return Err(FinderError::InvalidConfig(
                "industries must not be empty when set".into(),
            ));
        }
        ensure_positive_days("price_target_lookback_days", self.price_target_lookback_days)?;
        ensure_positive_days("analyst_lookback_days", self.analyst_lookback_days)?;
        ensure_finite("min_avg_price_target_change", self.min_avg_price_target_change)?;
        ensure_finite("min_quarterly_revenue_growth", self.min_quarterly_revenue_growth)?;
        ensure_finite("max_put_call_ratio", self.max_put_call_ratio)?;
        ensure_finite("max_price_earnings_ratio", self.max_price_earnings_ratio)?;
        ensure_nonzero("top_n", self.top_n)?;
        ensure_file_name("output_file", &self.output_file)
    }
}

/// Multi-source biotech screener with optional language model ranking.
pub struct MetaFinder {
    config: MetaFinderConfig,
}

impl MetaFinder {
    pub fn new(config: MetaFinderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MetaFinderConfig {
        &self.config
    }
}

#[async_trait]
impl Finder for MetaFinder {
    fn name(&self) -> &str {
        "meta"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let settings = ctx.config();
        let as_of = ctx.as_of();
        let industries = self
            .config
            .industries
            .clone()
            .unwrap_or_else(|| settings.universe.biotech_industries.clone());

        let mut symbols = ctx
            .screener_universe(settings.universe.query(), industries, Vec::new())
            .await?;

        let targets = ctx.price_targets(&symbols).await;
        let mut table = PriceTargetScreener::new(PriceTargetConfig {
            lookback_days: self.config.price_target_lookback_days,
            min_analysts: self.config.min_price_target_analysts,
        })
        .screen(&targets, as_of);
        table.retain_at_least("avg_price_target_change", self.config.min_avg_price_target_change);
        keep_listed(&mut symbols, &table);
        info!(symbols = symbols.len(), "Price target filter applied");

        let ratings = AnalystRatingsScreener::new(AnalystRatingsConfig {
            lookback_days: self.config.analyst_lookback_days,
            min_ratings_count: 0,
        })
        .screen(&ctx.grades(&symbols).await, as_of);
        let revenue = quarterly_revenue_growth(
            &ctx.income_statements(&symbols, ReportingPeriod::Quarter).await,
            DEFAULT_REVENUE_LOOKBACK_QUARTERS,
        );
        let estimates = future_revenue_growth(
            &ctx.estimates(&symbols, ReportingPeriod::Annual).await,
            as_of,
        );
        let ownership = institutional_ownership(&ctx.ownership(&symbols).await);
        let ratios = latest_ratios(&ctx.ratios(&symbols, ReportingPeriod::Quarter).await);

        table = left_merge_all(&table, &[&ratings, &revenue, &estimates, &ownership, &ratios]);
        ensure_columns(&mut table, &MERGED_COLUMNS);
        table.fill_empty(0.0);

        table.retain_at_least("avg_quarterly_revenue_growth", self.config.min_quarterly_revenue_growth);
        table.retain_at_least("bullish_count", self.config.min_bullish_count);
        table.retain_below("investors_put_call_ratio", self.config.max_put_call_ratio);
        table.retain_at_most("price_earnings_ratio", self.config.max_price_earnings_ratio);
        info!(candidates = table.len(), "Fundamental filters applied");

        table.derive_column("inverted_price_earnings_ratio", |row| {
            row.number("price_earnings_ratio")
                .map(|pe| 1.0 / if pe == 0.0 { ZERO_PE_REPLACEMENT } else { pe })
        });
        normalized_weighted_score(&mut table, "weighted_score", &META_WEIGHTS)?;
        table.sort_by("weighted_score", true);
        table.head(self.config.top_n);

        let mut ranked_by = "weighted_score";
        if let Some(llm) = ctx.ranking_generator() {
            let ranks = rank_candidates(llm.as_ref(), &table).await;
            let moats = economic_moat_scores(llm.as_ref(), ctx.source().as_ref(), &table.symbols()).await;
            table = left_merge_all(&table, &[&ranks, &moats]);
            table.sort_by("llm_rank", true);
            ranked_by = "llm_rank";
        }

        table.select(&OUTPUT_COLUMNS);
        table.round(settings.thresholds.precision);

        let mut files = vec![ctx.write_results(&self.config.output_file, &table)?];
        if self.config.generate_reports {
            let reports = ctx.report_generator("meta")?;
            files.extend(reports.generate_all(&table.symbols()).await);
        }

        Ok(FinderReport::new(self.name(), table)
            .ranked_by(ranked_by)
            .with_files(files))
    }
}
