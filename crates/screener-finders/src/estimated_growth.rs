//! Estimated growth: uptrending names in growth industries whose analysts
//! expect revenue and net income to keep rising.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::traits::ScreenerQuery;
use screener_core::types::{Join, PriceHistory, ReportingPeriod, ScoreRow, ScoreTable};
use screener_screens::{
    estimated_net_income_change, future_revenue_growth, BySymbol, PriceTargetConfig,
    PriceTargetScreener,
};
use screener_stats::linear_slope;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::finder::{ensure_file_name, ensure_finite, ensure_nonzero, ensure_positive_days, Finder, FinderConfig};
use crate::scoring::{ensure_columns, inner_merge_all, keep_listed, normalized_weighted_score};
use crate::{FinderContext, FinderReport};

/// Weights of `weighted_score`, applied to min-max scaled columns.
pub const ESTIMATED_GROWTH_WEIGHTS: [(&str, f64); 4] = [
    ("avg_estimated_revenue_change", 0.4),
    ("avg_estimated_net_income_change", 0.2),
    ("avg_price_target_change", 0.2),
    ("inv_pe", 0.2),
];

/// Industries the universe is drawn from.
pub fn default_growth_industries() -> Vec<String> {
    [
        "Semiconductors",
        "Consumer Electronics",
        "Software - Infrastructure",
        "Internet Content & Information",
        "Biotechnology",
        "Telecommunications Services",
        "Communication Equipment",
        "Information Technology Services",
        "Medical - Diagnostics & Research",
        "Medical - Instruments & Supplies",
        "Computer Hardware",
        "Gambling, Resorts & Casinos",
        "Electronic Gaming & Multimedia",
        "Renewable Utilities",
        "Solar",
        "Technology Distributors",
        "Medical - Equipment & Services",
        "Internet Software/Services",
        "Software - Application",
        "Luxury Goods",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatedGrowthConfig {
    pub min_price: f64,
    pub max_price: f64,
    pub min_volume: f64,
    pub limit: usize,
    pub industries: Vec<String>,
    pub price_history_days: i64,
    /// Bars in the trend slope
    pub trend_window: usize,
    /// Minimum close slope, in price per bar
    pub min_trend_slope: f64,
    /// Bars in the monthly low
    pub monthly_low_window: usize,
    /// A close within this multiple of the monthly low is near it
    pub near_low_multiple: f64,
    pub min_estimate_analysts: f64,
    pub price_target_lookback_days: i64,
    pub output_file: String,
}

impl Default for EstimatedGrowthConfig {
    fn default() -> Self {
        Self {
            min_price: 1.0,
            max_price: 1000.0,
            min_volume: 5000.0,
            limit: 3000,
            industries: default_growth_industries(),
            price_history_days: 400,
            trend_window: 10,
            min_trend_slope: 0.01,
            monthly_low_window: 20,
            near_low_multiple: 1.2,
            min_estimate_analysts: 3.0,
            price_target_lookback_days: 60,
            output_file: "estimated_growth_candidates.csv".to_string(),
        }
    }
}

impl FinderConfig for EstimatedGrowthConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_finite("min_price", self.min_price)?;
        ensure_finite("max_price", self.max_price)?;
        ensure_finite("min_volume", self.min_volume)?;
        ensure_nonzero("limit", self.limit)?;
        ensure_positive_days("price_history_days", self.price_history_days)?;
        if self.trend_window < 2 {
            return Err(FinderError::InvalidConfig(
                "trend_window must be at least 2".into(),
            ));
        }
        ensure_finite("min_trend_slope", self.min_trend_slope)?;
        ensure_nonzero("monthly_low_window", self.monthly_low_window)?;
        ensure_finite("near_low_multiple", self.near_low_multiple)?;
        ensure_finite("min_estimate_analysts", self.min_estimate_analysts)?;
        ensure_positive_days("price_target_lookback_days", self.price_target_lookback_days)?;
        ensure_file_name("output_file", &self.output_file)
    }
}

pub struct EstimatedGrowthFinder {
    config: EstimatedGrowthConfig,
}

impl EstimatedGrowthFinder {
    pub fn new(config: EstimatedGrowthConfig) -> Self {
        Self { config }
    }

    /// Uptrending symbols with `close_slope` and `near_monthly_low` (1 or 0).
    fn price_trends(&self, prices: &BySymbol<PriceHistory>) -> ScoreTable {
        let window = self.config.trend_window.max(self.config.monthly_low_window);
        let mut table = ScoreTable::with_columns(&["close_slope", "near_monthly_low"]);

        for (symbol, history) in prices {
            let closes = history.closes();
            if closes.len() < window {
                debug!(symbol = %symbol, bars = closes.len(), "Not enough price history");
                continue;
            }
            let slope = linear_slope(&closes[closes.len() - self.config.trend_window..]);
            if slope <= self.config.min_trend_slope {
                continue;
            }

            let recent = &closes[closes.len() - self.config.monthly_low_window..];
            let monthly_low = recent.iter().copied().fold(f64::INFINITY, f64::min);
            let last = closes[closes.len() - 1];
            let near_low = last <= monthly_low * self.config.near_low_multiple;

            table.push(
                ScoreRow::new(symbol.clone())
                    .with("close_slope", slope)
                    .with("near_monthly_low", if near_low { 1.0 } else { 0.0 }),
            );
        }

        table
    }
}

#[async_trait]
impl Finder for EstimatedGrowthFinder {
    fn name(&self) -> &str {
        "estimated-growth"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let as_of = ctx.as_of();
        let query = ScreenerQuery {
            price_more_than: Some(self.config.min_price),
            price_lower_than: Some(self.config.max_price),
            volume_more_than: Some(self.config.min_volume),
            is_actively_trading: true,
            limit: self.config.limit,
            ..Default::default()
        };
        let mut symbols = ctx
            .screener_universe(query, self.config.industries.clone(), Vec::new())
            .await?;

        let trends = self.price_trends(&ctx.prices(&symbols, self.config.price_history_days).await);
        keep_listed(&mut symbols, &trends);
        info!(symbols = symbols.len(), "Trend screen applied");

        let estimates = ctx.estimates(&symbols, ReportingPeriod::Annual).await;
        let mut growth = future_revenue_growth(&estimates, as_of)
            .merge(&estimated_net_income_change(&estimates, as_of), Join::Inner);
        let min_analysts = self.config.min_estimate_analysts;
        growth.retain(|row| {
            row.number("avg_estimated_revenue_change").is_some_and(|v| v > 0.0)
                && row.number("avg_estimated_net_income_change").is_some_and(|v| v > 0.0)
                && row.number("avg_revenue_estimate_analysts").is_some_and(|v| v >= min_analysts)
        });
        keep_listed(&mut symbols, &growth);
        info!(symbols = symbols.len(), "Estimate screen applied");

        let mut targets = PriceTargetScreener::new(PriceTargetConfig {
            lookback_days: self.config.price_target_lookback_days,
            min_analysts: 0,
        })
        .screen(&ctx.price_targets(&symbols).await, as_of);
        ensure_columns(&mut targets, &["avg_price_target_change", "num_price_target_analysts"]);
        targets.select(&["avg_price_target_change", "num_price_target_analysts"]);
        targets.retain(|row| row.number("avg_price_target_change").is_some_and(|v| v > 0.0));
        keep_listed(&mut symbols, &targets);
        info!(symbols = symbols.len(), "Price target screen applied");

        let mut valuation = ScoreTable::with_columns(&["pe_ratio", "inv_pe"]);
        for (symbol, outlook) in ctx.outlooks(&symbols).await {
            let pe = outlook.latest_ratios().and_then(|r| r.pe()).unwrap_or(0.0);
            let inv_pe = if pe == 0.0 { 0.0 } else { 1.0 / pe };
            valuation.push(ScoreRow::new(symbol).with("pe_ratio", pe).with("inv_pe", inv_pe));
        }

        let mut table = inner_merge_all(&trends, &[&growth, &targets, &valuation]);
        normalized_weighted_score(&mut table, "weighted_score", &ESTIMATED_GROWTH_WEIGHTS)?;
        table.sort_by("weighted_score", true);
        table.round(ctx.config().thresholds.precision);

        let path = ctx.write_results(&self.config.output_file, &table)?;
        Ok(FinderReport::new(self.name(), table)
            .ranked_by("weighted_score")
            .with_files([path]))
    }
}
