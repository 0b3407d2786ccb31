//! Stock screeners and scoring factors.
//!
//! Every screener is a pure transform from per-symbol records to a
//! `ScoreTable`:
//! - Growth acceleration and the annual growth factor
//! - 52-week low price drop
//! - Momentum (screener, factor and lookback returns)
//! - Earnings and revenue estimates
//! - Analyst ratings and price targets
//! - Institutional ownership
//! - Quality factor and latest financial ratios
//! - Dividend yield and quarterly revenue growth
//! - News and social sentiment
//! - Company outlook statistics and section scores
//!
//! Inputs are keyed by symbol in a `BTreeMap` so output rows come out in a
//! stable order before any sorting.

mod config;
mod dividends;
mod estimates;
mod fundamentals;
mod growth;
mod momentum;
mod ownership;
mod price_drop;
mod price_targets;
mod ratings;
mod ratios;
mod registry;
mod revenue;
mod sentiment;

/// Per-symbol input map.
pub type BySymbol<T> = std::collections::BTreeMap<String, T>;

pub use config::ScreenConfig;
pub use dividends::{dividend_yield, yearly_dividend_yields, DividendYieldConfig};
pub use estimates::{
    estimated_eps_change, estimated_net_income_change, future_revenue_growth, EarningsEstimateConfig,
    EarningsEstimateScreener, RevenueEstimateStats,
};
pub use fundamentals::{
    final_score, statement_stats, OutlookSections, Scale, SectionScore, StatementStats, Term,
    ANNUAL_BALANCE_SHEET_SCORE, ANNUAL_CASHFLOW_SCORE, ANNUAL_INCOME_SCORE, INST_OWN_SCORE,
    OVERVALUED_ANNUAL_INCOME_SCORE, OVERVALUED_FINAL_WEIGHTS, OVERVALUED_INST_OWN_SCORE,
    OVERVALUED_QUARTERLY_INCOME_SCORE, OVERVALUED_RATIOS_SCORE, PENNY_BALANCE_SHEET_SCORE,
    PENNY_CASHFLOW_SCORE, PENNY_FINAL_WEIGHTS, PENNY_INCOME_SCORE, PENNY_INST_OWN_SCORE,
    PENNY_RATIOS_SCORE, PRICE_TARGET_SCORE, QUARTERLY_BALANCE_SHEET_SCORE,
    QUARTERLY_CASHFLOW_SCORE, QUARTERLY_INCOME_SCORE, RATIOS_SCORE, VALUE_FINAL_WEIGHTS,
};
pub use growth::{growth_factor, GrowthFactorConfig, GrowthScreener, GrowthScreenerConfig};
pub use momentum::{
    lookback_returns, momentum_factor, MomentumFactorConfig, MomentumScreener,
    MomentumScreenerConfig, TRADING_DAYS_PER_HALF_YEAR,
};
pub use ownership::{institutional_ownership, ownership_row};
pub use price_drop::{FiftyTwoWeekLowConfig, FiftyTwoWeekLowScreener, TRADING_DAYS_PER_YEAR};
pub use price_targets::{PriceTargetConfig, PriceTargetScreener, PriceTargetStats};
pub use ratings::{
    analyst_rating_scores, AnalystRatingsConfig, AnalystRatingsScreener, GradeClass, GradeCounts,
};
pub use ratios::{latest_ratios, quality_factor, QualityFactorConfig};
pub use registry::{ScreenerInfo, ScreenerRegistry};
pub use revenue::{quarterly_revenue_growth, DEFAULT_REVENUE_LOOKBACK_QUARTERS};
pub use sentiment::{
    news_sentiment, social_sentiment, SocialSentimentConfig, NEWS_ARTICLE_LIMIT,
};
