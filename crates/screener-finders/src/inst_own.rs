//! Institutional ownership: discounted growers ranked by the change in
//! money institutions have put into them.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_core::types::ReportingPeriod;
use screener_screens::{
    institutional_ownership, FiftyTwoWeekLowConfig, FiftyTwoWeekLowScreener, GrowthScreener,
    GrowthScreenerConfig,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::finder::{ensure_file_name, ensure_finite, ensure_positive_days, Finder, FinderConfig};
use crate::scoring::{inner_merge_all, keep_listed};
use crate::{FinderContext, FinderReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstOwnConfig {
    pub price_history_days: i64,
    /// Minimum drop from the 52-week high (0.2 = 20%)
    pub min_price_drop: f64,
    pub min_revenue_growth: f64,
    pub min_earnings_growth: f64,
    pub output_file: String,
}

impl Default for InstOwnConfig {
    fn default() -> Self {
        Self {
            price_history_days: 400,
            min_price_drop: 0.2,
            min_revenue_growth: 0.1,
            min_earnings_growth: 0.1,
            output_file: "inst_own_candidates.csv".to_string(),
        }
    }
}

impl FinderConfig for InstOwnConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_positive_days("price_history_days", self.price_history_days)?;
        ensure_finite("min_price_drop", self.min_price_drop)?;
        ensure_finite("min_revenue_growth", self.min_revenue_growth)?;
        ensure_finite("min_earnings_growth", self.min_earnings_growth)?;
        ensure_file_name("output_file", &self.output_file)
    }
}

pub struct InstOwnFinder {
    config: InstOwnConfig,
}

impl InstOwnFinder {
    pub fn new(config: InstOwnConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Finder for InstOwnFinder {
    fn name(&self) -> &str {
        "inst-own"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let mut symbols = ctx
            .screener_universe(ctx.config().universe.query(), Vec::new(), Vec::new())
            .await?;

        let prices = ctx.prices(&symbols, self.config.price_history_days).await;
        let drops = FiftyTwoWeekLowScreener::new(FiftyTwoWeekLowConfig {
            min_price_drop: Some(self.config.min_price_drop),
            ..Default::default()
        })
        .screen(&prices, ctx.as_of());
        keep_listed(&mut symbols, &drops);
        info!(symbols = symbols.len(), "52-week low screen applied");

        let ownership = institutional_ownership(&ctx.ownership(&symbols).await);
        keep_listed(&mut symbols, &ownership);

        let growth = GrowthScreener::new(GrowthScreenerConfig {
            min_revenue_growth: self.config.min_revenue_growth,
            min_earnings_growth: self.config.min_earnings_growth,
            ..Default::default()
        })
        .screen(&ctx.income_growth(&symbols, ReportingPeriod::Quarter).await);
        info!(symbols = growth.len(), "Growth screen applied");

        let mut table = inner_merge_all(&drops, &[&ownership, &growth]);
        table.sort_by("total_invested_change", true);
        table.round(ctx.config().thresholds.precision);

        let path = ctx.write_results(&self.config.output_file, &table)?;
        Ok(FinderReport::new(self.name(), table)
            .ranked_by("total_invested_change")
            .with_files([path]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, days_ago, growth, listing, trending};
    use screener_core::types::{IncomeGrowth, InstitutionalOwnership};
    use screener_data::InMemorySource;

    fn accelerating() -> Vec<IncomeGrowth> {
        vec![
            growth(270, 0.02, 0.02),
            growth(180, 0.04, 0.05),
            growth(90, 0.08, 0.1),
            growth(0, 0.2, 0.25),
        ]
    }

    fn invested(change: f64) -> Vec<InstitutionalOwnership> {
        vec![
            InstitutionalOwnership {
                date: Some(days_ago(120)),
                total_invested_change: Some(-1.0),
                ..Default::default()
            },
            InstitutionalOwnership {
                date: Some(days_ago(30)),
                investors_holding: Some(100.0),
                total_invested: Some(5e8),
                total_invested_change: Some(change),
                ..Default::default()
            },
        ]
    }

    #[tokio::test]
    async fn test_inst_own_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let source = InMemorySource::new()
            .with_listings(vec![
                listing("SOME", "Software"),
                listing("MORE", "Software"),
                listing("FLAT", "Software"),
                listing("NOHOLD", "Software"),
                listing("SLOW", "Software"),
            ])
            .with_prices(trending("SOME", 400, 100.0, 70.0))
            .with_prices(trending("MORE", 400, 100.0, 75.0))
            .with_prices(trending("FLAT", 400, 100.0, 100.0))
            .with_prices(trending("NOHOLD", 400, 100.0, 60.0))
            .with_prices(trending("SLOW", 400, 100.0, 60.0))
            .with_ownership("SOME", invested(5.0))
            .with_ownership("MORE", invested(12.0))
            .with_ownership("FLAT", invested(50.0))
            .with_ownership("SLOW", invested(30.0))
            .with_income_growth("SOME", ReportingPeriod::Quarter, accelerating())
            .with_income_growth("MORE", ReportingPeriod::Quarter, accelerating())
            .with_income_growth("FLAT", ReportingPeriod::Quarter, accelerating())
            .with_income_growth("NOHOLD", ReportingPeriod::Quarter, accelerating())
            .with_income_growth("SLOW", ReportingPeriod::Quarter, vec![growth(0, 0.01, 0.01)]);
        let ctx = context(source, dir.path());

        let report = InstOwnFinder::new(InstOwnConfig::default()).run(&ctx).await.unwrap();

        // FLAT never dropped, NOHOLD has no holders, SLOW does not grow
        assert_eq!(report.table.symbols(), vec!["MORE", "SOME"]);
        assert_eq!(report.table.number("MORE", "total_invested_change"), Some(12.0));
        assert_eq!(report.table.number("SOME", "investors_holding"), Some(100.0));
        assert!(report.table.has_column("price_drop_percent"));
        assert!(report.files[0].ends_with("inst_own_candidates.csv"));
    }

    #[test]
    fn test_config_validation() {
        assert!(InstOwnConfig::default().validate().is_ok());
        let config = InstOwnConfig {
            output_file: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
