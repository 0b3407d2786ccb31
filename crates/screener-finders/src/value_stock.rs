//! Value stocks: mid and large caps with low multiples, growing revenue
//! and analyst upside, written as a multi-sheet workbook.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::traits::ScreenerQuery;
use screener_core::types::ScoreTable;
use screener_screens::{
    institutional_ownership, OutlookSections, PriceTargetConfig, PriceTargetScreener,
    ANNUAL_BALANCE_SHEET_SCORE, ANNUAL_CASHFLOW_SCORE, ANNUAL_INCOME_SCORE,
    INST_OWN_SCORE, PRICE_TARGET_SCORE, QUARTERLY_BALANCE_SHEET_SCORE, QUARTERLY_CASHFLOW_SCORE,
    QUARTERLY_INCOME_SCORE, RATIOS_SCORE, VALUE_FINAL_WEIGHTS,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::finder::{ensure_file_name, ensure_finite, ensure_nonzero, ensure_positive_days, Finder, FinderConfig};
use crate::outlook::{score_section, section_sheets, weighted_final_score, write_workbook};
use crate::{FinderContext, FinderReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueStockConfig {
    pub min_price: f64,
    pub min_market_cap: f64,
    pub limit: usize,
    pub price_target_lookback_days: i64,
    /// Add an Institutional Ownership sheet
    pub include_ownership: bool,
    /// Workbook name prefix; the run date is appended
    pub workbook_prefix: String,
}

impl Default for ValueStockConfig {
    fn default() -> Self {
        Self {
            min_price: 5.0,
            min_market_cap: 200_000_000.0,
            limit: 1000,
            price_target_lookback_days: 90,
            include_ownership: true,
            workbook_prefix: "value_stock_candidates".to_string(),
        }
    }
}

impl FinderConfig for ValueStockConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_finite("min_price", self.min_price)?;
        ensure_finite("min_market_cap", self.min_market_cap)?;
        ensure_nonzero("limit", self.limit)?;
        ensure_positive_days("price_target_lookback_days", self.price_target_lookback_days)?;
        ensure_file_name("workbook_prefix", &self.workbook_prefix)
    }
}

pub struct ValueStockFinder {
    config: ValueStockConfig,
}

impl ValueStockFinder {
    pub fn new(config: ValueStockConfig) -> Self {
        Self { config }
    }

    fn query(&self) -> ScreenerQuery {
        ScreenerQuery {
            price_more_than: Some(self.config.min_price),
            market_cap_more_than: Some(self.config.min_market_cap),
            limit: self.config.limit,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Finder for ValueStockFinder {
    fn name(&self) -> &str {
        "value-stock"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let as_of = ctx.as_of();
        let mut symbols = ctx.screener_universe(self.query(), Vec::new(), Vec::new()).await?;
        // Share classes and foreign listings carry a dot
        symbols.retain(|s| !s.contains('.'));

        let outlooks = ctx.outlooks(&symbols).await;
        info!(symbols = symbols.len(), outlooks = outlooks.len(), "Company outlooks loaded");
        let covered: Vec<String> = outlooks.keys().cloned().collect();

        let mut sections = OutlookSections::from_outlooks(&outlooks);
        let mut targets = PriceTargetScreener::new(PriceTargetConfig {
            lookback_days: self.config.price_target_lookback_days,
            min_analysts: 0,
        })
        .screen(&ctx.price_targets(&covered).await, as_of);
        let mut ownership = if self.config.include_ownership {
            institutional_ownership(&ctx.ownership(&covered).await)
        } else {
            ScoreTable::new()
        };

        score_section(&mut sections.ratios, &RATIOS_SCORE)?;
        score_section(&mut sections.quarterly_income, &QUARTERLY_INCOME_SCORE)?;
        score_section(&mut sections.annual_income, &ANNUAL_INCOME_SCORE)?;
        score_section(&mut sections.quarterly_balance_sheet, &QUARTERLY_BALANCE_SHEET_SCORE)?;
        score_section(&mut sections.annual_balance_sheet, &ANNUAL_BALANCE_SHEET_SCORE)?;
        score_section(&mut sections.quarterly_cashflow, &QUARTERLY_CASHFLOW_SCORE)?;
        score_section(&mut sections.annual_cashflow, &ANNUAL_CASHFLOW_SCORE)?;
        score_section(&mut targets, &PRICE_TARGET_SCORE)?;
        if self.config.include_ownership {
            score_section(&mut ownership, &INST_OWN_SCORE)?;
        }

        // Balance sheet, cash flow and ownership scores are reported on
        // their sheets only; the final score weighs these four sections.
        let scores = weighted_final_score(
            &[&sections.ratios, &sections.quarterly_income, &sections.annual_income, &targets],
            &VALUE_FINAL_WEIGHTS,
        );
        debug!(scored = scores.len(), "Final scores calculated");

        let mut sheets = section_sheets(sections, &scores);
        sheets.push(("Price Target", targets));
        if self.config.include_ownership {
            sheets.push(("Institutional Ownership", ownership));
        }
        let path = write_workbook(ctx, &self.config.workbook_prefix, &scores, sheets)?;

        Ok(FinderReport::new(self.name(), scores)
            .ranked_by("final_score")
            .with_files([path]))
    }
}
