//! Fundamental, analyst and sentiment records as returned by the provider.
//!
//! Field names follow the provider's camelCase payloads. Numeric fields are
//! optional because the provider omits or nulls them freely.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates::{flexible_date, flexible_date_opt};

/// One row of the provider's stock screener.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockListing {
    pub symbol: String,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub exchange_short_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_etf: Option<bool>,
    #[serde(default)]
    pub is_actively_trading: Option<bool>,
}

impl StockListing {
    /// Create a bare listing for a symbol.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Set the industry.
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }
}

/// Income statement growth rates for one fiscal period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeGrowth {
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub growth_revenue: Option<f64>,
    #[serde(default)]
    pub growth_net_income: Option<f64>,
    #[serde(default, rename = "growthEPS")]
    pub growth_eps: Option<f64>,
}

/// Financial ratios for one fiscal period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRatios {
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub return_on_equity: Option<f64>,
    #[serde(default)]
    pub debt_equity_ratio: Option<f64>,
    #[serde(default)]
    pub price_earnings_ratio: Option<f64>,
    #[serde(default)]
    pub price_to_sales_ratio: Option<f64>,
    #[serde(default)]
    pub price_to_book_ratio: Option<f64>,
    #[serde(default)]
    pub current_ratio: Option<f64>,
    #[serde(default)]
    pub gross_profit_margin: Option<f64>,
    #[serde(default)]
    pub net_profit_margin: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
}

impl FinancialRatios {
    /// Snake-case column names and values, in output order.
    pub fn columns(&self) -> [(&'static str, Option<f64>); 9] {
        [
            ("return_on_equity", self.return_on_equity),
            ("debt_equity_ratio", self.debt_equity_ratio),
            ("price_earnings_ratio", self.price_earnings_ratio),
            ("price_to_sales_ratio", self.price_to_sales_ratio),
            ("price_to_book_ratio", self.price_to_book_ratio),
            ("current_ratio", self.current_ratio),
            ("gross_profit_margin", self.gross_profit_margin),
            ("net_profit_margin", self.net_profit_margin),
            ("dividend_yield", self.dividend_yield),
        ]
    }
}

/// An analyst grade change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalystGrade {
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub grading_company: Option<String>,
    #[serde(default)]
    pub previous_grade: Option<String>,
    #[serde(default)]
    pub new_grade: String,
}

impl AnalystGrade {
    /// Create a grade with only the fields used for scoring.
    pub fn new(date: NaiveDate, new_grade: impl Into<String>) -> Self {
        Self {
            date,
            grading_company: None,
            previous_grade: None,
            new_grade: new_grade.into(),
        }
    }
}

/// A published analyst price target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTarget {
    #[serde(deserialize_with = "flexible_date")]
    pub published_date: NaiveDate,
    #[serde(default)]
    pub price_target: Option<f64>,
    #[serde(default)]
    pub adj_price_target: Option<f64>,
    #[serde(default)]
    pub price_when_posted: Option<f64>,
    #[serde(default)]
    pub analyst_name: Option<String>,
    #[serde(default)]
    pub analyst_company: Option<String>,
    #[serde(default)]
    pub news_title: Option<String>,
}

impl PriceTarget {
    /// Create a target with only the fields used for scoring.
    pub fn new(published_date: NaiveDate, adj_price_target: f64, price_when_posted: f64) -> Self {
        Self {
            published_date,
            price_target: Some(adj_price_target),
            adj_price_target: Some(adj_price_target),
            price_when_posted: Some(price_when_posted),
            analyst_name: None,
            analyst_company: None,
            news_title: None,
        }
    }

    /// Target change relative to the price when posted, in percent.
    pub fn change_percent(&self) -> Option<f64> {
        let target = self.adj_price_target?;
        let posted = self.price_when_posted?;
        if posted == 0.0 {
            return None;
        }
        Some((target - posted) / posted * 100.0)
    }
}

/// Consensus analyst estimates for one future fiscal period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsEstimate {
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub estimated_revenue_avg: Option<f64>,
    #[serde(default)]
    pub estimated_revenue_low: Option<f64>,
    #[serde(default)]
    pub estimated_revenue_high: Option<f64>,
    #[serde(default)]
    pub estimated_eps_avg: Option<f64>,
    #[serde(default)]
    pub estimated_eps_low: Option<f64>,
    #[serde(default)]
    pub estimated_eps_high: Option<f64>,
    #[serde(default)]
    pub number_analyst_estimated_revenue: Option<f64>,
    #[serde(default)]
    pub number_analysts_estimated_eps: Option<f64>,
    #[serde(default)]
    pub estimated_net_income_avg: Option<f64>,
}

impl EarningsEstimate {
    /// Create an estimate with EPS and revenue averages.
    pub fn new(date: NaiveDate, eps: f64, revenue: f64, analysts: f64) -> Self {
        Self {
            date,
            estimated_revenue_avg: Some(revenue),
            estimated_revenue_low: None,
            estimated_revenue_high: None,
            estimated_eps_avg: Some(eps),
            estimated_eps_low: None,
            estimated_eps_high: None,
            number_analyst_estimated_revenue: Some(analysts),
            number_analysts_estimated_eps: Some(analysts),
            estimated_net_income_avg: None,
        }
    }

    pub fn with_net_income(mut self, net_income: f64) -> Self {
        self.estimated_net_income_avg = Some(net_income);
        self
    }
}

/// Quarterly institutional ownership summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionalOwnership {
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub investors_holding: Option<f64>,
    #[serde(default)]
    pub investors_holding_change: Option<f64>,
    #[serde(default)]
    pub total_invested: Option<f64>,
    #[serde(default)]
    pub total_invested_change: Option<f64>,
    #[serde(default)]
    pub put_call_ratio: Option<f64>,
    #[serde(default)]
    pub put_call_ratio_change: Option<f64>,
}

/// A dividend payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dividend {
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub adj_dividend: Option<f64>,
    #[serde(default)]
    pub dividend: Option<f64>,
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub payment_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub declaration_date: Option<NaiveDate>,
}

impl Dividend {
    /// Create a dividend paid on `date`.
    pub fn new(date: NaiveDate, adj_dividend: f64) -> Self {
        Self {
            date,
            adj_dividend: Some(adj_dividend),
            dividend: Some(adj_dividend),
            payment_date: Some(date),
            declaration_date: None,
        }
    }

    /// Date used to bucket the payment into a calendar year.
    pub fn effective_date(&self) -> NaiveDate {
        self.payment_date.unwrap_or(self.date)
    }
}

/// A news article about a symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub url: String,
}

/// Daily social media sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialSentiment {
    #[serde(deserialize_with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub stocktwits_sentiment: Option<f64>,
    #[serde(default)]
    pub twitter_sentiment: Option<f64>,
}

/// Income statement for one fiscal period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub revenue: Option<f64>,
    #[serde(default)]
    pub cost_and_expenses: Option<f64>,
    #[serde(default)]
    pub gross_profit: Option<f64>,
    #[serde(default)]
    pub operating_income: Option<f64>,
    #[serde(default)]
    pub net_income: Option<f64>,
    #[serde(default)]
    pub eps: Option<f64>,
}

/// Balance sheet for one fiscal period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub cash_and_short_term_investments: Option<f64>,
    #[serde(default)]
    pub total_debt: Option<f64>,
    #[serde(default)]
    pub total_stockholders_equity: Option<f64>,
}

/// Cash flow statement for one fiscal period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowStatement {
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub operating_cash_flow: Option<f64>,
    #[serde(default)]
    pub capital_expenditure: Option<f64>,
    #[serde(default)]
    pub free_cash_flow: Option<f64>,
    // The provider spells it this way.
    #[serde(default, rename = "netCashUsedForInvestingActivites")]
    pub net_cash_used_for_investing_activities: Option<f64>,
}
