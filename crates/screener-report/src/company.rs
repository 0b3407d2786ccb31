//! Per-company HTML reports.

use chrono::NaiveDate;
use minijinja::Environment;
use screener_ai::limit_tokens;
use screener_core::error::{DataError, ReportError};
use screener_core::traits::{MarketDataSource, TextGenerator};
use screener_core::types::{
    round_to, CompanyOutlook, CompanyProfile, EarningsEstimate, NewsArticle, PressRelease,
    ReportingPeriod,
};
use screener_screens::{estimated_eps_change, BySymbol, GradeCounts, PriceTargetStats, RevenueEstimateStats};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const TEMPLATE_NAME: &str = "company_report.html";
const TEMPLATE: &str = include_str!("templates/company_report.html");

/// Window of analyst grades and price targets shown in a report.
pub const REPORT_LOOKBACK_DAYS: i64 = 90;

const OWNERSHIP_PERIODS: usize = 3;
const NEWS_ITEMS: usize = 10;
const ANALYST_ROLE: &str = "Financial analyst";

/// A titled table of pre-formatted cells.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Section {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Section {
    /// Build a section from serializable records, one row per record.
    ///
    /// Headers come from the first record's field names.
    pub fn from_records<T: Serialize>(title: &str, records: &[T]) -> Self {
        let objects: Vec<serde_json::Map<String, Value>> = records
            .iter()
            .filter_map(|r| match serde_json::to_value(r) {
                Ok(Value::Object(map)) => Some(map),
                _ => None,
            })
            .collect();

        let keys: Vec<String> = objects
            .first()
            .map(|first| first.keys().cloned().collect())
            .unwrap_or_default();

        Self {
            title: title.to_string(),
            headers: keys.iter().map(|k| header_label(k)).collect(),
            rows: objects
                .iter()
                .map(|obj| keys.iter().map(|k| format_value(obj.get(k))).collect())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Consensus estimate summary of one reporting period type.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EstimateSummary {
    pub revenue: RevenueEstimateStats,
    pub avg_estimated_eps_change: Option<f64>,
    pub details: Section,
}

impl EstimateSummary {
    fn from_estimates(title: &str, symbol: &str, estimates: Vec<EarningsEstimate>, as_of: NaiveDate) -> Self {
        let revenue = RevenueEstimateStats::from_estimates(&estimates, as_of);

        let mut future: Vec<EarningsEstimate> = estimates.into_iter().filter(|e| e.date > as_of).collect();
        future.sort_by_key(|e| e.date);

        let mut by_symbol = BySymbol::new();
        by_symbol.insert(symbol.to_string(), future.clone());
        let avg_estimated_eps_change = estimated_eps_change(&by_symbol, as_of)
            .number(symbol, "avg_estimated_eps_change")
            .map(|v| round_to(v, 2));

        Self {
            revenue,
            avg_estimated_eps_change,
            details: Section::from_records(title, &future),
        }
    }
}

/// Everything rendered into one company report.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyReport {
    pub symbol: String,
    pub company_name: String,
    pub generated_on: NaiveDate,
    pub profile: CompanyProfile,
    pub rating: Option<String>,
    pub news: Vec<NewsArticle>,
    pub press_releases: Vec<PressRelease>,
    pub narrative: Option<String>,
    pub ratios: Vec<(String, String)>,
    pub statements: Vec<Section>,
    pub grades: GradeCounts,
    pub price_targets: Option<PriceTargetStats>,
    pub quarterly_estimates: EstimateSummary,
    pub annual_estimates: EstimateSummary,
    pub ownership: Section,
}

/// Gathers company data and renders `<reports_dir>/<SYMBOL>_report.html`.
pub struct CompanyReportGenerator {
    source: Arc<dyn MarketDataSource>,
    generator: Option<Arc<dyn TextGenerator>>,
    reports_dir: PathBuf,
    as_of: NaiveDate,
    max_prompt_tokens: usize,
    env: Environment<'static>,
}

impl CompanyReportGenerator {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        reports_dir: impl Into<PathBuf>,
        as_of: NaiveDate,
    ) -> Result<Self, ReportError> {
        let mut env = Environment::new();
        env.add_filter("num", format_number);
        env.add_template(TEMPLATE_NAME, TEMPLATE)
            .map_err(|e| ReportError::Template(e.to_string()))?;

        Ok(Self {
            source,
            generator: None,
            reports_dir: reports_dir.into(),
            as_of,
            max_prompt_tokens: 6000,
            env,
        })
    }

    /// Add an LLM narrative on growth potential and economic moat.
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>, max_prompt_tokens: usize) -> Self {
        self.generator = Some(generator);
        self.max_prompt_tokens = max_prompt_tokens;
        self
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    /// Path of a symbol's report.
    pub fn report_path(&self, symbol: &str) -> PathBuf {
        self.reports_dir.join(format!("{}_report.html", symbol))
    }

    /// Collect the report content; `None` when the provider has no outlook.
    pub async fn load(&self, symbol: &str) -> Result<Option<CompanyReport>, ReportError> {
        let Some(outlook) = self.source.company_outlook(symbol).await.map_err(data_error)? else {
            warn!(symbol, "No company outlook returned");
            return Ok(None);
        };

        let grades = self
            .fetch_or_default(symbol, "analyst grades", self.source.analyst_grades(symbol))
            .await;
        let targets = self
            .fetch_or_default(symbol, "price targets", self.source.price_targets(symbol))
            .await;
        let quarterly = self
            .fetch_or_default(
                symbol,
                "quarterly estimates",
                self.source.analyst_estimates(symbol, ReportingPeriod::Quarter),
            )
            .await;
        let annual = self
            .fetch_or_default(
                symbol,
                "annual estimates",
                self.source.analyst_estimates(symbol, ReportingPeriod::Annual),
            )
            .await;
        let mut ownership = self
            .fetch_or_default(symbol, "institutional ownership", self.source.institutional_ownership(symbol))
            .await;
        ownership.sort_by(|a, b| b.date.cmp(&a.date));
        ownership.truncate(OWNERSHIP_PERIODS);

        let narrative = self.narrative(symbol, &outlook).await;

        Ok(Some(CompanyReport {
            symbol: symbol.to_string(),
            company_name: outlook
                .profile
                .company_name
                .clone()
                .unwrap_or_else(|| "Company".to_string()),
            generated_on: self.as_of,
            rating: outlook.latest_rating().and_then(|r| r.rating_recommendation.clone()),
            news: outlook.stock_news.iter().take(NEWS_ITEMS).cloned().collect(),
            press_releases: outlook.press_releases.iter().take(NEWS_ITEMS).cloned().collect(),
            narrative,
            ratios: outlook
                .latest_ratios()
                .map(|r| {
                    r.columns()
                        .iter()
                        .map(|(name, value)| (header_label(name), format_number(*value)))
                        .collect()
                })
                .unwrap_or_default(),
            statements: statement_sections(&outlook),
            grades: GradeCounts::from_grades(&grades, self.as_of, REPORT_LOOKBACK_DAYS),
            price_targets: PriceTargetStats::from_targets(&targets, self.as_of, REPORT_LOOKBACK_DAYS),
            quarterly_estimates: EstimateSummary::from_estimates(
                "Quarterly Estimates",
                symbol,
                quarterly,
                self.as_of,
            ),
            annual_estimates: EstimateSummary::from_estimates("Annual Estimates", symbol, annual, self.as_of),
            ownership: Section::from_records("Institutional Ownership", &ownership),
            profile: outlook.profile,
        }))
    }

    /// Render report content to HTML.
    pub fn render(&self, report: &CompanyReport) -> Result<String, ReportError> {
        let template = self
            .env
            .get_template(TEMPLATE_NAME)
            .map_err(|e| ReportError::Template(e.to_string()))?;
        template
            .render(report)
            .map_err(|e| ReportError::Template(e.to_string()))
    }

    /// Load, render and write one report.
    ///
    /// Returns the written path, or `None` when there was nothing to report.
    pub async fn generate(&self, symbol: &str) -> Result<Option<PathBuf>, ReportError> {
        debug!(symbol, "Generating company report");
        let Some(report) = self.load(symbol).await? else {
            return Ok(None);
        };

        let html = self.render(&report)?;
        std::fs::create_dir_all(&self.reports_dir)?;
        let path = self.report_path(symbol);
        std::fs::write(&path, html)?;

        info!(symbol, path = %path.display(), "Company report written");
        Ok(Some(path))
    }

    /// Write reports for several symbols; failures are logged and skipped.
    pub async fn generate_all(&self, symbols: &[String]) -> Vec<PathBuf> {
        let mut written = Vec::new();
        for symbol in symbols {
            match self.generate(symbol).await {
                Ok(Some(path)) => written.push(path),
                Ok(None) => {}
                Err(e) => warn!(symbol = %symbol, error = %e, "Failed to generate report"),
            }
        }
        written
    }

    async fn fetch_or_default<T: Default>(
        &self,
        symbol: &str,
        what: &str,
        fetch: impl std::future::Future<Output = Result<T, DataError>>,
    ) -> T {
        match fetch.await {
            Ok(value) => value,
            Err(e) => {
                warn!(symbol, what, error = %e, "Report section unavailable");
                T::default()
            }
        }
    }

    async fn narrative(&self, symbol: &str, outlook: &CompanyOutlook) -> Option<String> {
        let generator = self.generator.as_ref()?;

        let mut content = outlook.profile.description.clone().unwrap_or_default();
        for release in &outlook.press_releases {
            content.push_str("\n\n");
            content.push_str(&release.title);
            content.push('\n');
            content.push_str(&release.text);
        }
        if content.trim().is_empty() {
            return None;
        }

        let prompt = format!(
            "Analyze this company update in respect to potential for future stock price growth, \
             and economic moat factors. Briefly discuss the potential of the main products and/or services. \
             Only return the analysis, no introductory text!\nContent: {}",
            limit_tokens(&content, self.max_prompt_tokens)
        );

        match generator.generate(ANALYST_ROLE, &prompt).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(symbol, error = %e, "Narrative generation failed");
                None
            }
        }
    }
}

fn data_error(e: DataError) -> ReportError {
    ReportError::Internal(e.to_string())
}

fn statement_sections(outlook: &CompanyOutlook) -> Vec<Section> {
    let quarter = &outlook.financials_quarter;
    let annual = &outlook.financials_annual;
    [
        Section::from_records("Quarterly Income", &quarter.income),
        Section::from_records("Annual Income", &annual.income),
        Section::from_records("Quarterly Balance Sheet", &quarter.balance),
        Section::from_records("Annual Balance Sheet", &annual.balance),
        Section::from_records("Quarterly Cash Flow", &quarter.cash),
        Section::from_records("Annual Cash Flow", &annual.cash),
    ]
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect()
}

/// `costAndExpenses` / `price_to_sales_ratio_ttm` -> `Cost And Expenses` / `Price To Sales Ratio Ttm`
fn header_label(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in key.chars() {
        if c == '_' || c == ' ' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::Number(n)) => format_number(n.as_f64()),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Two decimals with thousands separators; `N/A` when missing.
fn format_number(value: Option<f64>) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return "N/A".to_string();
    };

    let fixed = format!("{:.2}", v.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::new();
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if v < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use screener_core::error::AiError;
    use screener_core::types::{
        AnalystGrade, FinancialStatements, IncomeStatement, InstitutionalOwnership, PriceTarget,
        TtmRatios,
    };
    use screener_data::InMemorySource;

    struct FixedNarrative;

    #[async_trait]
    impl TextGenerator for FixedNarrative {
        async fn generate(&self, role: &str, prompt: &str) -> Result<String, AiError> {
            assert_eq!(role, "Financial analyst");
            assert!(prompt.contains("economic moat"));
            Ok("Durable brand & pricing power.".to_string())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn outlook() -> CompanyOutlook {
        CompanyOutlook {
            profile: CompanyProfile {
                symbol: "ACME".to_string(),
                company_name: Some("Acme <Corp>".to_string()),
                description: Some("Makes anvils.".to_string()),
                mkt_cap: Some(1_500_000_000.0),
                ..Default::default()
            },
            ratios: vec![TtmRatios {
                pe_ratio: Some(18.5),
                ..Default::default()
            }],
            stock_news: vec![NewsArticle {
                published_date: Some(day(2024, 5, 30)),
                title: "Acme beats estimates".to_string(),
                ..Default::default()
            }],
            financials_quarter: FinancialStatements {
                income: vec![IncomeStatement {
                    date: Some(day(2024, 3, 31)),
                    revenue: Some(1_234_567.0),
                    ..Default::default()
                }],
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn source() -> Arc<InMemorySource> {
        let ownership = InstitutionalOwnership {
            date: Some(day(2024, 3, 31)),
            investors_holding: Some(812.0),
            ..Default::default()
        };

        Arc::new(
            InMemorySource::new()
                .with_outlook("ACME", outlook())
                .with_grades(
                    "ACME",
                    vec![
                        AnalystGrade::new(day(2024, 5, 20), "Buy"),
                        AnalystGrade::new(day(2023, 1, 1), "Sell"),
                    ],
                )
                .with_price_targets("ACME", vec![PriceTarget::new(day(2024, 5, 1), 120.0, 100.0)])
                .with_ownership("ACME", vec![ownership]),
        )
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(Some(1_234_567.891)), "1,234,567.89");
        assert_eq!(format_number(Some(-950.0)), "-950.00");
        assert_eq!(format_number(Some(0.5)), "0.50");
        assert_eq!(format_number(None), "N/A");
    }

    #[test]
    fn test_header_label() {
        assert_eq!(header_label("costAndExpenses"), "Cost And Expenses");
        assert_eq!(header_label("price_to_sales_ratio_ttm"), "Price To Sales Ratio Ttm");
    }

    #[tokio::test]
    async fn test_load_report_content() {
        let generator = CompanyReportGenerator::new(source(), "reports", day(2024, 6, 1)).unwrap();
        let report = generator.load("ACME").await.unwrap().unwrap();

        assert_eq!(report.company_name, "Acme <Corp>");
        assert_eq!(report.grades.buy, 1);
        assert_eq!(report.grades.total, 1);
        assert_eq!(report.price_targets.unwrap().num_price_target_analysts, 1);
        assert_eq!(report.statements.len(), 1);
        assert_eq!(report.statements[0].title, "Quarterly Income");
        assert_eq!(report.ownership.rows.len(), 1);
        assert!(report.narrative.is_none());
    }

    #[tokio::test]
    async fn test_generate_writes_escaped_html() {
        let dir = tempfile::tempdir().unwrap();
        let generator = CompanyReportGenerator::new(source(), dir.path().join("reports"), day(2024, 6, 1))
            .unwrap()
            .with_generator(Arc::new(FixedNarrative), 100);

        let path = generator.generate("ACME").await.unwrap().unwrap();

        assert_eq!(path.file_name().unwrap(), "ACME_report.html");
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("Acme &lt;Corp&gt;"));
        assert!(html.contains("Acme beats estimates"));
        assert!(html.contains("Durable brand &amp; pricing power."));
        assert!(html.contains("1,234,567.00"));
    }

    #[tokio::test]
    async fn test_missing_outlook_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let generator = CompanyReportGenerator::new(source(), dir.path(), day(2024, 6, 1)).unwrap();

        assert!(generator.generate("NONE").await.unwrap().is_none());
        let written = generator.generate_all(&["NONE".to_string(), "ACME".to_string()]).await;
        assert_eq!(written.len(), 1);
    }
}
