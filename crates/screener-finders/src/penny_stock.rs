//! Penny stocks: sub-$4 small caps ranked on margins, liquidity, cash and
//! institutional interest, written as a multi-sheet workbook.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::traits::ScreenerQuery;
use screener_screens::{
    institutional_ownership, OutlookSections, PriceTargetConfig, PriceTargetScreener,
    PENNY_BALANCE_SHEET_SCORE, PENNY_CASHFLOW_SCORE, PENNY_FINAL_WEIGHTS, PENNY_INCOME_SCORE,
    PENNY_INST_OWN_SCORE, PENNY_RATIOS_SCORE, PRICE_TARGET_SCORE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::finder::{ensure_file_name, ensure_finite, ensure_nonzero, ensure_positive_days, Finder, FinderConfig};
use crate::outlook::{score_section, section_sheets, weighted_final_score, write_workbook};
use crate::{FinderContext, FinderReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PennyStockConfig {
    pub min_price: f64,
    pub max_price: f64,
    pub max_market_cap: f64,
    pub limit: usize,
    pub price_target_lookback_days: i64,
    /// Workbook name prefix; the run date is appended
    pub workbook_prefix: String,
}

impl Default for PennyStockConfig {
    fn default() -> Self {
        Self {
            min_price: 1.0,
            max_price: 4.0,
            max_market_cap: 1_000_000_000.0,
            limit: 1000,
            price_target_lookback_days: 90,
            workbook_prefix: "penny_stock_candidates".to_string(),
        }
    }
}

impl FinderConfig for PennyStockConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_finite("min_price", self.min_price)?;
        ensure_finite("max_price", self.max_price)?;
        ensure_finite("max_market_cap", self.max_market_cap)?;
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

pub struct PennyStockFinder {
    config: PennyStockConfig,
}

impl PennyStockFinder {
    pub fn new(config: PennyStockConfig) -> Self {
        Self { config }
    }

    fn query(&self) -> ScreenerQuery {
        ScreenerQuery {
            price_more_than: Some(self.config.min_price),
            price_lower_than: Some(self.config.max_price),
            market_cap_lower_than: Some(self.config.max_market_cap),
            is_actively_trading: true,
            limit: self.config.limit,
            ..Default::default()
        }
    }
}

#[async_trait]
impl Finder for PennyStockFinder {
    fn name(&self) -> &str {
        "penny-stock"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let mut symbols = ctx.screener_universe(self.query(), Vec::new(), Vec::new()).await?;
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

        score_section(&mut sections.ratios, &PENNY_RATIOS_SCORE)?;
        score_section(&mut sections.quarterly_income, &PENNY_INCOME_SCORE)?;
        score_section(&mut sections.quarterly_balance_sheet, &PENNY_BALANCE_SHEET_SCORE)?;
        score_section(&mut sections.quarterly_cashflow, &PENNY_CASHFLOW_SCORE)?;
        score_section(&mut ownership, &PENNY_INST_OWN_SCORE)?;
        score_section(&mut targets, &PRICE_TARGET_SCORE)?;

        let scores = weighted_final_score(
            &[
                &sections.ratios,
                &sections.quarterly_income,
                &sections.quarterly_balance_sheet,
                &sections.quarterly_cashflow,
                &ownership,
            ],
            &PENNY_FINAL_WEIGHTS,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, days_ago, listing};
    use screener_core::types::{
        CompanyOutlook, InstitutionalOwnership, StockListing, TtmRatios,
    };
    use screener_data::InMemorySource;
    use screener_report::read_workbook;

    fn penny(symbol: &str, price: f64) -> StockListing {
        StockListing {
            price: Some(price),
            market_cap: Some(300_000_000.0),
            ..listing(symbol, "Biotechnology")
        }
    }

    fn outlook(margin: f64, current: f64, debt_equity: f64) -> CompanyOutlook {
        CompanyOutlook {
            ratios: vec![TtmRatios {
                gross_profit_margin: Some(margin),
                current_ratio: Some(current),
                debt_equity_ratio: Some(debt_equity),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn holders(holding: f64, change: f64, put_call: f64) -> Vec<InstitutionalOwnership> {
        vec![InstitutionalOwnership {
            date: Some(days_ago(30)),
            investors_holding: Some(holding),
            investors_holding_change: Some(change),
            put_call_ratio: Some(put_call),
            ..Default::default()
        }]
    }

    fn source() -> InMemorySource {
        InMemorySource::new()
            .with_listings(vec![
                penny("LEAN", 2.0),
                penny("HEAVY", 3.0),
                penny("DEAR", 12.0),
                StockListing {
                    market_cap: Some(5_000_000_000.0),
                    ..penny("BIG", 2.5)
                },
            ])
            .with_outlook("LEAN", outlook(0.6, 2.0, 0.5))
            .with_outlook("HEAVY", outlook(0.2, 1.0, 1.0))
            .with_outlook("DEAR", outlook(0.9, 3.0, 0.1))
            .with_outlook("BIG", outlook(0.9, 3.0, 0.1))
            .with_ownership("LEAN", holders(40.0, 5.0, 0.5))
            .with_ownership("HEAVY", holders(10.0, -2.0, 1.5))
    }

    #[tokio::test]
    async fn test_penny_stock_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(source(), dir.path());

        let report = PennyStockFinder::new(PennyStockConfig::default()).run(&ctx).await.unwrap();

        // DEAR is above $4 and BIG above $1B
        assert_eq!(report.table.symbols(), vec!["LEAN", "HEAVY"]);
        assert_eq!(report.table.number("LEAN", "ratios_score"), Some(0.9));
        assert_eq!(report.table.number("HEAVY", "ratios_score"), Some(-0.1));
        assert_eq!(report.table.number("LEAN", "inst_own_score"), Some(0.8));
        assert_eq!(report.table.number("HEAVY", "inst_own_score"), Some(-0.2));
        assert_eq!(report.table.number("LEAN", "final_score"), Some(1.7));
        assert_eq!(report.table.number("HEAVY", "final_score"), Some(-0.3));

        let workbook = read_workbook(&report.files[0]).unwrap();
        assert_eq!(workbook.len(), 12);
        assert_eq!(workbook[1].0, "Scores");
        assert_eq!(workbook[11].1.symbols(), vec!["LEAN", "HEAVY"]);
        assert!(report.files[0].ends_with("penny_stock_candidates_2024-06-28"));
    }

    #[test]
    fn test_config_validation() {
        assert!(PennyStockConfig::default().validate().is_ok());
        let config = PennyStockConfig {
            min_price: 5.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
