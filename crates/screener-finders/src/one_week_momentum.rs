//! One-week momentum: the universe ranked by last week's return.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use screener_screens::lookback_returns;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::finder::{ensure_file_name, ensure_positive_days, Finder, FinderConfig};
use crate::{FinderContext, FinderReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OneWeekMomentumConfig {
    pub lookback_days: i64,
    /// Top symbols that get a company report; 0 disables reports
    pub report_top_n: usize,
    pub output_file: String,
}

impl Default for OneWeekMomentumConfig {
    fn default() -> Self {
        Self {
            lookback_days: 7,
            report_top_n: 20,
            output_file: "weekly_momentum_results.csv".to_string(),
        }
    }
}

impl FinderConfig for OneWeekMomentumConfig {
    fn validate(&self) -> Result<(), FinderError> {
        ensure_positive_days("lookback_days", self.lookback_days)?;
        ensure_file_name("output_file", &self.output_file)
    }
}

pub struct OneWeekMomentumFinder {
    config: OneWeekMomentumConfig,
}

impl OneWeekMomentumFinder {
    pub fn new(config: OneWeekMomentumConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Finder for OneWeekMomentumFinder {
    fn name(&self) -> &str {
        "one-week-momentum"
    }

    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport> {
        let symbols = ctx
            .screener_universe(ctx.config().universe.query(), Vec::new(), Vec::new())
            .await?;

        let prices = ctx.prices(&symbols, self.config.lookback_days).await;
        let table = lookback_returns(&prices, "weekly_return");
        if table.is_empty() {
            warn!("No momentum stats calculated");
        }
        info!(symbols = table.len(), "Weekly returns calculated");

        let mut files = vec![ctx.write_results(&self.config.output_file, &table)?];
        if self.config.report_top_n > 0 {
            let top: Vec<String> = table.symbols().into_iter().take(self.config.report_top_n).collect();
            let reports = ctx.report_generator("one_week_momentum")?;
            files.extend(reports.generate_all(&top).await);
        }

        Ok(FinderReport::new(self.name(), table)
            .ranked_by("weekly_return")
            .with_files(files))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, history, listing};
    use screener_core::types::{CompanyOutlook, CompanyProfile};
    use screener_data::InMemorySource;
    use screener_report::read_table_csv;

    #[tokio::test]
    async fn test_weekly_returns() {
        let dir = tempfile::tempdir().unwrap();
        let outlook = CompanyOutlook {
            profile: CompanyProfile {
                company_name: Some("Up Corp".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let source = InMemorySource::new()
            .with_listings(vec![
                listing("UP", "Software"),
                listing("DOWN", "Software"),
                listing("ONE", "Software"),
            ])
            .with_prices(history("UP", &[10.0, 10.5, 11.0, 12.5]))
            .with_prices(history("DOWN", &[10.0, 9.5, 9.0]))
            .with_prices(history("ONE", &[10.0]))
            .with_outlook("UP", outlook);
        let ctx = context(source, dir.path());
        let config = OneWeekMomentumConfig {
            report_top_n: 1,
            ..Default::default()
        };

        let report = OneWeekMomentumFinder::new(config).run(&ctx).await.unwrap();

        // ONE has a single bar
        assert_eq!(report.table.symbols(), vec!["UP", "DOWN"]);
        assert_eq!(report.table.number("UP", "weekly_return"), Some(25.0));
        assert_eq!(report.table.number("DOWN", "weekly_return"), Some(-10.0));

        assert_eq!(report.files.len(), 2);
        let written = read_table_csv(&report.files[0]).unwrap();
        assert_eq!(written.symbols(), vec!["UP", "DOWN"]);
        assert!(report.files[1].ends_with("one_week_momentum/UP_report.html"));
    }
}
