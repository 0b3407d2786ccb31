//! Overvalued stocks: high-priced names with rich multiples and stalling
//! income, written as a multi-sheet workbook for short ideas.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::traits::ScreenerQuery;
use screener_screens::{
    institutional_ownership, OutlookSections, PriceTargetConfig, PriceTargetScreener,
    OVERVALUED_ANNUAL_INCOME_SCORE, OVERVALUED_FINAL_WEIGHTS, OVERVALUED_INST_OWN_SCORE,
    OVERVALUED_QUARTERLY_INCOME_SCORE, OVERVALUED_RATIOS_SCORE, PRICE_TARGET_SCORE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::finder::{ensure_file_name, ensure_finite, ensure_nonzero, ensure_positive_days, Finder, FinderConfig};
use crate::outlook::{score_section, section_sheets, weighted_final_score, write_workbook};
use crate::{FinderContext, FinderReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvervaluedStockConfig {
    pub min_price: f64,
    pub max_price: f64,
    pub limit: usize,
    pub price_target_lookback_days: i64,
    /// Workbook name prefix; the run date is appended
    pub workbook_prefix: String,
}

impl Default for OvervaluedStockConfig {
    fn default() -> Self {
        Self {
            min_price: 200.0,
            max_price: 5000.0,
            limit: 1000,
            price_target_lookback_days: 90,
            workbook_prefix: "overvalued_stock_candidates".to_string(),
        }
    }
}

impl FinderConfig for OvervaluedStockConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_finite("min_price", self.min_price)?;
        ensure_finite("max_price", self.max_price)?;
        if self.min_price >= self.max_price {
            return Err(FinderError::InvalidConfig(
                "min_price must be below max_price".into(),
            ));
        }
        ensure_nonzero("limit", self.limit)?;
        ensure_positive_days("price_target_lookback_days", self.price_target_lookback_days)?;
        ensure_file_name("workbook_prefix", &self.workbook_prefix)
    }
}

pub struct OvervaluedStockFinder {
    config: OvervaluedStockConfig,
}

impl OvervaluedStockFinder {
    pub fn new(config: OvervaluedStockConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Finder for OvervaluedStockFinder {
    fn name(&self) -> &str {
        "overvalued-stock"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let query = ScreenerQuery {
            price_more_than: Some(self.config.min_price),
            price_lower_than: Some(self.config.max_price),
            is_actively_trading: true,
            limit: self.config.limit,
            ..Default::default()
        };
        let mut symbols = ctx.screener_universe(query, Vec::new(), Vec::new()).await?;
        symbols.retain(|s| !s.contains('.'));

        let outlooks = ctx.outlooks(&symbols).await;
        info!(symbols = symbols.len(), outlooks = outlooks.len(), "Company outlooks loaded");
        let covered: Vec<String> = outlooks.keys().cloned().collect();

        let mut sections = OutlookSections::from_outlooks(&outlooks);
        let mut targets = PriceTargetScreener::new(PriceTargetConfig {
            lookback_days: self.config.price_target_lookback_days,
            min_analysts: 0,
        })
        .screen(&ctx.price_targets(&covered).await, ctx.as_of());
        let mut ownership = institutional_ownership(&ctx.ownership(&covered).await);

        score_section(&mut sections.ratios, &OVERVALUED_RATIOS_SCORE)?;
        score_section(&mut sections.quarterly_income, &OVERVALUED_QUARTERLY_INCOME_SCORE)?;
        score_section(&mut sections.annual_income, &OVERVALUED_ANNUAL_INCOME_SCORE)?;
        score_section(&mut targets, &PRICE_TARGET_SCORE)?;
        score_section(&mut ownership, &OVERVALUED_INST_OWN_SCORE)?;

        // Balance sheets and cash flows are listed unscored
        let scores = weighted_final_score(
            &[&sections.ratios, &sections.quarterly_income, &sections.annual_income],
            &OVERVALUED_FINAL_WEIGHTS,
        );
        debug!(scored = scores.len(), "Final scores calculated");

        let mut sheets = section_sheets(sections, &scores);
        sheets.push(("Price Target", targets));
        sheets.push(("Institutional Ownership", ownership));
        let path = write_workbook(ctx, &self.config.workbook_prefix, &scores, sheets)?;

        Ok(FinderReport::new(self.name(), scores)
            .ranked_by("final_score")
            .with_files([path]))
    }
}
