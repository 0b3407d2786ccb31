//! Company outlook statistics and weighted section scores.
//!
//! Statement sections (income, balance sheet, cash flow) are summarized as
//! the latest value of each tracked field plus its trend: the least-squares
//! slope of the period-over-period changes. Section scores min-max normalize
//! a few columns and combine them with fixed weights; the final score blends
//! section scores into one ranking.

use chrono::NaiveDate;
use screener_core::error::StatsError;
use screener_core::types::{
    round_to, BalanceSheet, CashFlowStatement, CompanyOutlook, IncomeStatement, Join, ScoreRow,
    ScoreTable, TtmRatios,
};
use screener_stats::{normalize_columns, LinearTrend};

use crate::BySymbol;

/// A dated financial statement with tracked fields.
pub trait StatementStats {
    /// End date of the fiscal period.
    fn period_date(&self) -> Option<NaiveDate>;

    /// Tracked fields as `(last value column, trend column, value)`.
    fn tracked(&self) -> Vec<(&'static str, &'static str, Option<f64>)>;
}

impl StatementStats for IncomeStatement {
    fn period_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn tracked(&self) -> Vec<(&'static str, &'static str, Option<f64>)> {
        vec![
            ("last_revenue", "revenue_trend", self.revenue),
            ("last_net_income", "net_income_trend", self.net_income),
            ("last_cost_expenses", "cost_expenses_trend", self.cost_and_expenses),
        ]
    }
}

impl StatementStats for BalanceSheet {
    fn period_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn tracked(&self) -> Vec<(&'static str, &'static str, Option<f64>)> {
        vec![
            ("last_total_assets", "total_assets_trend", self.total_assets),
            (
                "last_cash_short_term_investments",
                "cash_short_term_investments_trend",
                self.cash_and_short_term_investments,
            ),
            ("last_total_debt", "total_debt_trend", self.total_debt),
            (
                "last_total_shareholders_equity",
                "total_shareholders_equity_trend",
                self.total_stockholders_equity,
            ),
        ]
    }
}

impl StatementStats for CashFlowStatement {
    fn period_date(&self) -> Option<NaiveDate> {
        self.date
    }

    fn tracked(&self) -> Vec<(&'static str, &'static str, Option<f64>)> {
        vec![
            ("last_operating_cashflow", "operating_cashflow_trend", self.operating_cash_flow),
            ("last_capital_expenditure", "capital_expenditure_trend", self.capital_expenditure),
            ("last_free_cashflow", "free_cashflow_trend", self.free_cash_flow),
            (
                "last_net_cash_for_investing",
                "net_cash_for_investing_trend",
                self.net_cash_used_for_investing_activities,
            ),
        ]
    }
}

fn statement_columns<T: StatementStats + Default>() -> Vec<&'static str> {
    let fields = T::default().tracked();
    let mut columns: Vec<&'static str> = fields.iter().map(|(last, _, _)| *last).collect();
    columns.extend(fields.iter().map(|(_, trend, _)| *trend));
    columns
}

/// Last values and trends of one symbol's statements, rounded to 2 decimals.
///
/// Statements without a date are ignored. Returns `None` when nothing is left.
pub fn statement_stats<T: StatementStats>(symbol: &str, statements: &[T]) -> Option<ScoreRow> {
    let mut dated: Vec<(NaiveDate, Vec<(&'static str, &'static str, Option<f64>)>)> = statements
        .iter()
        .filter_map(|s| Some((s.period_date()?, s.tracked())))
        .collect();
    if dated.is_empty() {
        return None;
    }
    dated.sort_by_key(|(date, _)| *date);

    let (_, newest) = &dated[dated.len() - 1];
    let mut row = ScoreRow::new(symbol);
    for (last, _, value) in newest {
        row.set(last, value.map(|v| round_to(v, 2)));
    }
    for (i, (_, trend, _)) in newest.iter().enumerate() {
        let series: Vec<f64> = dated.iter().filter_map(|(_, fields)| fields[i].2).collect();
        row.set(trend, round_to(LinearTrend.trend(&series), 2));
    }
    Some(row)
}

fn statement_table<T, F>(outlooks: &BySymbol<CompanyOutlook>, statements: F) -> ScoreTable
where
    T: StatementStats + Default,
    F: Fn(&CompanyOutlook) -> &[T],
{
    let mut table = ScoreTable::with_columns(&statement_columns::<T>());
    for (symbol, outlook) in outlooks {
        if let Some(row) = statement_stats(symbol, statements(outlook)) {
            table.push(row);
        }
    }
    table
}

/// Per-section tables built from company outlooks.
#[derive(Debug, Clone, Default)]
pub struct OutlookSections {
    pub profile: ScoreTable,
    pub news: ScoreTable,
    pub ratios: ScoreTable,
    pub quarterly_income: ScoreTable,
    pub annual_income: ScoreTable,
    pub quarterly_balance_sheet: ScoreTable,
    pub annual_balance_sheet: ScoreTable,
    pub quarterly_cashflow: ScoreTable,
    pub annual_cashflow: ScoreTable,
}

impl OutlookSections {
    /// Summarize every outlook into the section tables.
    pub fn from_outlooks(outlooks: &BySymbol<CompanyOutlook>) -> Self {
        let mut profile = ScoreTable::with_columns(&[
            "company_name",
            "description",
            "website",
            "mkt_cap",
            "industry",
            "sector",
            "price",
            "vol_avg",
            "beta",
        ]);
        let mut news = ScoreTable::with_columns(&["news_headlines"]);
        let ratio_columns: Vec<&str> = TtmRatios::default().columns().iter().map(|(c, _)| *c).collect();
        let mut ratios = ScoreTable::with_columns(&ratio_columns);

        for (symbol, outlook) in outlooks {
            let p = &outlook.profile;
            profile.push(
                ScoreRow::new(symbol.clone())
                    .with("company_name", p.company_name.clone())
                    .with("description", p.description.clone())
                    .with("website", p.website.clone())
                    .with("mkt_cap", p.mkt_cap)
                    .with("industry", p.industry.clone())
                    .with("sector", p.sector.clone())
                    .with("price", p.price)
                    .with("vol_avg", p.vol_avg)
                    .with("beta", p.beta),
            );
            news.push(ScoreRow::new(symbol.clone()).with("news_headlines", outlook.news_headlines(" | ")));

            let latest = outlook.latest_ratios().cloned().unwrap_or_default();
            let mut row = ScoreRow::new(symbol.clone());
            for (column, value) in latest.columns() {
                row.set(column, value);
            }
            ratios.push(row);
        }

        Self {
            profile,
            news,
            ratios,
            quarterly_income: statement_table(outlooks, |o| o.financials_quarter.income.as_slice()),
            annual_income: statement_table(outlooks, |o| o.financials_annual.income.as_slice()),
            quarterly_balance_sheet: statement_table(outlooks, |o| o.financials_quarter.balance.as_slice()),
            annual_balance_sheet: statement_table(outlooks, |o| o.financials_annual.balance.as_slice()),
            quarterly_cashflow: statement_table(outlooks, |o| o.financials_quarter.cash.as_slice()),
            annual_cashflow: statement_table(outlooks, |o| o.financials_annual.cash.as_slice()),
        }
    }
}

/// How a normalized column enters a section score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// The normalized value
    Direct,
    /// `1 / (x + 1)` of the normalized value, rewarding low values
    Inverse,
}

/// One weighted column of a section score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    pub column: &'static str,
    pub weight: f64,
    pub scale: Scale,
}

const fn direct(column: &'static str, weight: f64) -> Term {
    Term { column, weight, scale: Scale::Direct }
}

const fn inverse(column: &'static str, weight: f64) -> Term {
    Term { column, weight, scale: Scale::Inverse }
}

/// A named weighted combination of normalized columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionScore {
    pub target: &'static str,
    pub terms: &'static [Term],
}

/// Cheap valuation with healthy margins.
pub const RATIOS_SCORE: SectionScore = SectionScore {
    target: "ratios_score",
    terms: &[
        inverse("price_to_sales_ratio_ttm", 0.2),
        inverse("price_earnings_ratio_ttm", 0.6),
        direct("gross_profit_margin_ttm", 0.2),
    ],
};

pub const QUARTERLY_INCOME_SCORE: SectionScore = SectionScore {
    target: "quarterly_income_score",
    terms: &[direct("revenue_trend", 0.6), direct("last_revenue", 0.3)],
};

pub const ANNUAL_INCOME_SCORE: SectionScore = SectionScore {
    target: "annual_income_score",
    terms: &[direct("revenue_trend", 0.6), direct("cost_expenses_trend", -0.3)],
};

const BALANCE_SHEET_TERMS: &[Term] = &[
    direct("last_total_assets", 0.2),
    direct("last_cash_short_term_investments", 0.15),
    direct("last_total_debt", -0.2),
    direct("total_assets_trend", 0.25),
    direct("total_shareholders_equity_trend", 0.2),
];

pub const QUARTERLY_BALANCE_SHEET_SCORE: SectionScore = SectionScore {
    target: "quarterly_balance_sheet_score",
    terms: BALANCE_SHEET_TERMS,
};

pub const ANNUAL_BALANCE_SHEET_SCORE: SectionScore = SectionScore {
    target: "annual_balance_sheet_score",
    terms: BALANCE_SHEET_TERMS,
};

const CASHFLOW_TERMS: &[Term] = &[
    direct("last_operating_cashflow", 0.25),
    direct("last_free_cashflow", 0.2),
    direct("operating_cashflow_trend", 0.25),
    direct("free_cashflow_trend", 0.2),
    direct("capital_expenditure_trend", -0.1),
];

pub const QUARTERLY_CASHFLOW_SCORE: SectionScore = SectionScore {
    target: "quarterly_cashflow_score",
    terms: CASHFLOW_TERMS,
};

pub const ANNUAL_CASHFLOW_SCORE: SectionScore = SectionScore {
    target: "annual_cashflow_score",
    terms: CASHFLOW_TERMS,
};

/// Upside to the average target, backed by analyst coverage.
pub const PRICE_TARGET_SCORE: SectionScore = SectionScore {
    target: "price_target_score",
    terms: &[
        direct("avg_price_target_change", 0.7),
        direct("num_price_target_analysts", 0.3),
    ],
};

pub const INST_OWN_SCORE: SectionScore = SectionScore {
    target: "inst_own_score",
    terms: &[
        direct("investors_holding", 0.4),
        direct("investors_holding_change", 0.2),
        direct("total_invested", 0.4),
        direct("total_invested_change", 0.2),
        direct("investors_put_call_ratio", -1.0),
    ],
};

/// Weights of the value ranking's final score.
pub const VALUE_FINAL_WEIGHTS: [(&str, f64); 4] = [
    ("ratios_score", 0.4),
    ("quarterly_income_score", 0.4),
    ("annual_income_score", 0.1),
    ("price_target_score", 0.1),
];

/// Margins and liquidity for small companies.
pub const PENNY_RATIOS_SCORE: SectionScore = SectionScore {
    target: "ratios_score",
    terms: &[
        direct("gross_profit_margin_ttm", 0.6),
        direct("current_ratio_ttm", 0.3),
        direct("debt_equity_ratio_ttm", -0.1),
    ],
};

pub const PENNY_INCOME_SCORE: SectionScore = SectionScore {
    target: "quarterly_income_score",
    terms: &[
        direct("last_revenue", 0.4),
        direct("revenue_trend", 0.4),
        direct("cost_expenses_trend", -0.2),
    ],
};

pub const PENNY_BALANCE_SHEET_SCORE: SectionScore = SectionScore {
    target: "quarterly_balance_sheet_score",
    terms: &[
        direct("last_cash_short_term_investments", 0.5),
        direct("last_total_debt", -0.5),
    ],
};

pub const PENNY_CASHFLOW_SCORE: SectionScore = SectionScore {
    target: "quarterly_cashflow_score",
    terms: &[
        direct("last_operating_cashflow", 0.4),
        direct("free_cashflow_trend", 0.2),
        direct("last_free_cashflow", 0.2),
        direct("capital_expenditure_trend", -0.2),
    ],
};

pub const PENNY_INST_OWN_SCORE: SectionScore = SectionScore {
    target: "inst_own_score",
    terms: &[
        direct("investors_holding", 0.5),
        direct("investors_holding_change", 0.3),
        direct("investors_put_call_ratio", -0.2),
    ],
};

/// Weights of the penny stock ranking's final score.
pub const PENNY_FINAL_WEIGHTS: [(&str, f64); 5] = [
    ("ratios_score", 1.0),
    ("quarterly_income_score", 1.0),
    ("quarterly_balance_sheet_score", 1.0),
    ("quarterly_cashflow_score", 1.0),
    ("inst_own_score", 1.0),
];

/// Rich multiples and leverage.
pub const OVERVALUED_RATIOS_SCORE: SectionScore = SectionScore {
    target: "ratios_score",
    terms: &[
        direct("price_to_sales_ratio_ttm", 0.5),
        direct("debt_equity_ratio_ttm", 0.2),
    ],
};

/// Stalling revenue and earnings score high.
const STALLING_INCOME_TERMS: &[Term] = &[
    inverse("revenue_trend", 0.6),
    inverse("net_income_trend", 0.3),
];

pub const OVERVALUED_QUARTERLY_INCOME_SCORE: SectionScore = SectionScore {
    target: "quarterly_income_score",
    terms: STALLING_INCOME_TERMS,
};

pub const OVERVALUED_ANNUAL_INCOME_SCORE: SectionScore = SectionScore {
    target: "annual_income_score",
    terms: STALLING_INCOME_TERMS,
};

pub const OVERVALUED_INST_OWN_SCORE: SectionScore = SectionScore {
    target: "inst_own_score",
    terms: &[
        direct("investors_holding_change", 0.4),
        direct("investors_put_call_ratio", -0.6),
    ],
};

/// Weights of the overvalued ranking's final score.
pub const OVERVALUED_FINAL_WEIGHTS: [(&str, f64); 3] = [
    ("ratios_score", 0.4),
    ("quarterly_income_score", 0.2),
    ("annual_income_score", 0.1),
];

impl SectionScore {
    /// Columns the score reads.
    pub fn columns(&self) -> Vec<&'static str> {
        self.terms.iter().map(|t| t.column).collect()
    }

    /// Append the score column, rounded to 2 decimals.
    ///
    /// Inputs are normalized on a copy so the table keeps its raw values.
    /// Rows with an empty input get an empty score.
    ///
    /// # Errors
    /// Returns `StatsError::UnknownColumn` when the table lacks an input column.
    pub fn apply(&self, table: &mut ScoreTable) -> Result<(), StatsError> {
        let mut scaled = table.clone();
        normalize_columns(&mut scaled, &self.columns(), None)?;
        for term in self.terms.iter().filter(|t| t.scale == Scale::Inverse) {
            scaled.map_column(term.column, |v| v.map(|x| 1.0 / (x + 1.0)));
        }

        let weights: Vec<(&str, f64)> = self.terms.iter().map(|t| (t.column, t.weight)).collect();
        scaled.weighted_sum(self.target, &weights);

        let scores = scaled
            .column(self.target)
            .into_iter()
            .map(|v| v.map(|x| round_to(x, 2)))
            .collect();
        table.set_column(self.target, scores)
    }
}

/// Blend section scores into `final_score`.
///
/// Each entry is a section table, its score column and that column's
/// weight. Sections are outer-joined on symbol, missing scores count as 0,
/// and the result is rounded to 2 decimals and sorted descending.
pub fn final_score(sections: &[(&ScoreTable, &str, f64)]) -> ScoreTable {
    let mut scores = ScoreTable::new();
    for (table, column, _) in sections {
        let mut part = (*table).clone();
        part.select(&[column]);
        scores = scores.merge(&part, Join::Outer);
    }

    scores.fill_empty(0.0);
    let weights: Vec<(&str, f64)> = sections.iter().map(|(_, column, w)| (*column, *w)).collect();
    scores.weighted_sum("final_score", &weights);
    scores.round(2);
    scores.sort_by("final_score", true);
    scores
}
