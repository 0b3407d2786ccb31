//! Core data types for the stock screener.

pub mod dates;
mod fundamentals;
mod outlook;
mod period;
mod prices;
mod table;

pub use fundamentals::{
    AnalystGrade, BalanceSheet, CashFlowStatement, Dividend, EarningsEstimate, FinancialRatios,
    IncomeGrowth, IncomeStatement, InstitutionalOwnership, NewsArticle, PriceTarget,
    SocialSentiment, StockListing,
};
pub use outlook::{
    CompanyOutlook, CompanyProfile, CompanyRating, FinancialStatements, PressRelease, TtmRatios,
};
pub use period::{RefreshInterval, ReportingPeriod};
pub use prices::{Bar, PriceHistory};
pub use table::{round_to, Cell, Join, ScoreRow, ScoreTable, SYMBOL_COLUMN};
