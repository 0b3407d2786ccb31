//! Company outlook: the provider's one-call company snapshot.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::flexible_date_opt;
use super::fundamentals::{BalanceSheet, CashFlowStatement, IncomeStatement, NewsArticle};

/// Company profile section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub ceo: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub exchange_short_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub mkt_cap: Option<f64>,
    #[serde(default)]
    pub vol_avg: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Trailing-twelve-month ratios section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TtmRatios {
    #[serde(default, rename = "priceToSalesRatioTTM")]
    pub price_to_sales_ratio: Option<f64>,
    #[serde(default, rename = "priceEarningsRatioTTM")]
    pub price_earnings_ratio: Option<f64>,
    #[serde(default, rename = "peRatioTTM")]
    pub pe_ratio: Option<f64>,
    #[serde(default, rename = "grossProfitMarginTTM")]
    pub gross_profit_margin: Option<f64>,
    #[serde(default, rename = "operatingProfitMarginTTM")]
    pub operating_profit_margin: Option<f64>,
    #[serde(default, rename = "netProfitMarginTTM")]
    pub net_profit_margin: Option<f64>,
    #[serde(default, rename = "currentRatioTTM")]
    pub current_ratio: Option<f64>,
    #[serde(default, rename = "quickRatioTTM")]
    pub quick_ratio: Option<f64>,
    #[serde(default, rename = "debtEquityRatioTTM")]
    pub debt_equity_ratio: Option<f64>,
    #[serde(default, rename = "returnOnEquityTTM")]
    pub return_on_equity: Option<f64>,
    #[serde(default, rename = "interestCoverageTTM")]
    pub interest_coverage: Option<f64>,
    #[serde(default, rename = "dividendYielTTM")]
    pub dividend_yield: Option<f64>,
}

impl TtmRatios {
    /// P/E ratio, falling back to the short field name.
    pub fn pe(&self) -> Option<f64> {
        self.price_earnings_ratio.or(self.pe_ratio)
    }

    /// Column names and values, in output order.
    pub fn columns(&self) -> [(&'static str, Option<f64>); 11] {
        [
            ("price_to_sales_ratio_ttm", self.price_to_sales_ratio),
            ("price_earnings_ratio_ttm", self.pe()),
            ("gross_profit_margin_ttm", self.gross_profit_margin),
            ("operating_profit_margin_ttm", self.operating_profit_margin),
            ("net_profit_margin_ttm", self.net_profit_margin),
            ("current_ratio_ttm", self.current_ratio),
            ("quick_ratio_ttm", self.quick_ratio),
            ("debt_equity_ratio_ttm", self.debt_equity_ratio),
            ("return_on_equity_ttm", self.return_on_equity),
            ("interest_coverage_ttm", self.interest_coverage),
            ("dividend_yield_ttm", self.dividend_yield),
        ]
    }
}

/// A company press release.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressRelease {
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

/// Provider rating summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRating {
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub rating_score: Option<f64>,
    #[serde(default)]
    pub rating_recommendation: Option<String>,
}

/// Income, balance sheet and cash flow statements for one period type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatements {
    #[serde(default)]
    pub income: Vec<IncomeStatement>,
    #[serde(default)]
    pub balance: Vec<BalanceSheet>,
    #[serde(default)]
    pub cash: Vec<CashFlowStatement>,
}

/// Company outlook snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOutlook {
    #[serde(default)]
    pub profile: CompanyProfile,
    #[serde(default)]
    pub ratios: Vec<TtmRatios>,
    #[serde(default)]
    pub stock_news: Vec<NewsArticle>,
    #[serde(default)]
    pub press_releases: Vec<PressRelease>,
    #[serde(default)]
    pub financials_annual: FinancialStatements,
    #[serde(default)]
    pub financials_quarter: FinancialStatements,
    #[serde(default)]
    pub rating: Vec<CompanyRating>,
}

impl CompanyOutlook {
    /// The most recent TTM ratios, if any.
    pub fn latest_ratios(&self) -> Option<&TtmRatios> {
        self.ratios.first()
    }

    /// The provider rating, if any.
    pub fn latest_rating(&self) -> Option<&CompanyRating> {
        self.rating.first()
    }

    /// News headlines joined as `date: title` entries.
    pub fn news_headlines(&self, separator: &str) -> String {
        self.stock_news
            .iter()
            .map(|item| {
                let date = item
                    .published_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "N/A".to_string());
                let title = if item.title.is_empty() {
                    "No Title"
                } else {
                    item.title.as_str()
                };
                format!("{}: {}", date, title)
            })
            .collect::<Vec<_>>()
            .join(separator)
    }
}
