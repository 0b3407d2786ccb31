//! Overvalued biotech: biotech names trading near their 52-week high while
//! institutions buy more puts than calls.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_screens::{
    institutional_ownership, FiftyTwoWeekLowConfig, FiftyTwoWeekLowScreener, PriceTargetConfig,
    PriceTargetScreener,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::finder::{ensure_file_name, ensure_finite, ensure_nonzero, ensure_positive_days, Finder, FinderConfig};
use crate::scoring::left_merge_all;
use crate::{FinderContext, FinderReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OvervaluedBiotechConfig {
    pub price_history_days: i64,
    /// Last close must be at least this share of the 52-week high
    pub min_high_ratio: f64,
    /// Minimum institutional put/call ratio
    pub min_put_call_ratio: f64,
    pub price_target_lookback_days: i64,
    pub top_n: usize,
    /// Top symbols that get a company report; 0 disables reports
    pub report_top_n: usize,
    pub output_file: String,
}

impl Default for OvervaluedBiotechConfig {
    fn default() -> Self {
        Self {
            price_history_days: 365,
            min_high_ratio: 0.9,
            min_put_call_ratio: 1.0,
            price_target_lookback_days: 120,
            top_n: 20,
            report_top_n: 20,
            output_file: "overvalued_biotech_stocks.csv".to_string(),
        }
    }
}

impl FinderConfig for OvervaluedBiotechConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_positive_days("price_history_days", self.price_history_days)?;
        ensure_finite("min_high_ratio", self.min_high_ratio)?;
        ensure_finite("min_put_call_ratio", self.min_put_call_ratio)?;
        ensure_positive_days("price_target_lookback_days", self.price_target_lookback_days)?;
        ensure_nonzero("top_n", self.top_n)?;
        ensure_file_name("output_file", &self.output_file)
    }
}

pub struct OvervaluedBiotechFinder {
    config: OvervaluedBiotechConfig,
}

impl OvervaluedBiotechFinder {
    pub fn new(config: OvervaluedBiotechConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Finder for OvervaluedBiotechFinder {
    fn name(&self) -> &str {
        "overvalued-biotech"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let settings = ctx.config();
        let symbols = ctx
            .screener_universe(
                settings.universe.query(),
                settings.universe.biotech_industries.clone(),
                Vec::new(),
            )
            .await?;

        let prices = ctx.prices(&symbols, self.config.price_history_days).await;
        let mut near_high = FiftyTwoWeekLowScreener::new(FiftyTwoWeekLowConfig {
            min_price_drop: None,
            min_bars: 1,
            ..Default::default()
        })
        .screen(&prices, ctx.as_of());
        let ratio = self.config.min_high_ratio;
        near_high.retain(|row| match (row.number("current_close"), row.number("fifty_two_week_high")) {
            (Some(close), Some(high)) => close >= high * ratio,
            _ => false,
        });
        let symbols = near_high.symbols();
        info!(symbols = symbols.len(), "Near 52-week high");

        let targets = PriceTargetScreener::new(PriceTargetConfig {
            lookback_days: self.config.price_target_lookback_days,
            min_analysts: 0,
        })
        .screen(&ctx.price_targets(&symbols).await, ctx.as_of());
        let ownership = institutional_ownership(&ctx.ownership(&symbols).await);

        let mut table = left_merge_all(&near_high, &[&targets, &ownership]);
        let min_put_call = self.config.min_put_call_ratio;
        table.retain(|row| row.number("investors_put_call_ratio").is_some_and(|v| v > min_put_call));
        table.fill_empty(0.0);
        table.sort_by("investors_put_call_ratio", true);
        table.head(self.config.top_n);
        if table.is_empty() {
            warn!("No overvalued biotech candidates");
        }

        let mut files = vec![ctx.write_results(&self.config.output_file, &table)?];
        if self.config.report_top_n > 0 {
            let top: Vec<String> = table.symbols().into_iter().take(self.config.report_top_n).collect();
            let reports = ctx.report_generator("overvalued_biotech")?;
            files.extend(reports.generate_all(&top).await);
        }

        Ok(FinderReport::new(self.name(), table)
            .ranked_by("investors_put_call_ratio")
            .with_files(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, days_ago, listing, trending};
    use screener_core::types::{CompanyOutlook, InstitutionalOwnership};
    use screener_data::InMemorySource;

    fn put_call(ratio: f64) -> Vec<InstitutionalOwnership> {
        vec![InstitutionalOwnership {
            date: Some(days_ago(30)),
            put_call_ratio: Some(ratio),
            ..Default::default()
        }]
    }

    #[tokio::test]
    async fn test_overvalued_biotech_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let source = InMemorySource::new()
            .with_listings(vec![
                listing("BIO1", "Biotechnology"),
                listing("BIO2", "Biotechnology"),
                listing("CALLS", "Biotechnology"),
                listing("FADED", "Biotechnology"),
                listing("SOFT", "Software"),
            ])
            .with_prices(trending("BIO1", 250, 50.0, 100.0))
            .with_prices(trending("BIO2", 250, 90.0, 100.0))
            .with_prices(trending("CALLS", 250, 50.0, 100.0))
            .with_prices(trending("FADED", 250, 100.0, 50.0))
            .with_prices(trending("SOFT", 250, 50.0, 100.0))
            .with_ownership("BIO1", put_call(1.5))
            .with_ownership("BIO2", put_call(2.0))
            .with_ownership("CALLS", put_call(0.5))
            .with_ownership("FADED", put_call(3.0))
            .with_ownership("SOFT", put_call(3.0))
            .with_outlook("BIO2", CompanyOutlook::default());
        let ctx = context(source, dir.path());
        let config = OvervaluedBiotechConfig {
            report_top_n: 1,
            ..Default::default()
        };

        let report = OvervaluedBiotechFinder::new(config).run(&ctx).await.unwrap();

        // FADED is far off its high, CALLS is call-heavy, SOFT is not biotech
        assert_eq!(report.table.symbols(), vec!["BIO2", "BIO1"]);
        assert_eq!(report.table.number("BIO2", "investors_put_call_ratio"), Some(2.0));
        assert!((report.table.number("BIO1", "current_close").unwrap() - 100.0).abs() < 1e-9);
        assert_eq!(report.files.len(), 2);
        assert!(report.files[0].ends_with("overvalued_biotech_stocks.csv"));
        assert!(report.files[1].ends_with("overvalued_biotech/BIO2_report.html"));
    }

    #[test]
    fn test_config_validation() {
        assert!(OvervaluedBiotechConfig::default().validate().is_ok());
        let config = OvervaluedBiotechConfig {
            top_n: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
