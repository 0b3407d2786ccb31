//! Reporting periods and cache refresh intervals.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fiscal reporting period of a fundamentals request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportingPeriod {
    /// Annual filings
    #[default]
    Annual,
    /// Quarterly filings
    Quarter,
}

impl ReportingPeriod {
    /// Value of the provider's `period` query parameter.
    pub fn as_query(&self) -> &'static str {
        match self {
            ReportingPeriod::Annual => "annual",
            ReportingPeriod::Quarter => "quarter",
        }
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_query())
    }
}

impl FromStr for ReportingPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "annual" | "year" | "yearly" | "fy" => Ok(ReportingPeriod::Annual),
            "quarter" | "quarterly" | "q" => Ok(ReportingPeriod::Quarter),
            _ => Err(format!("Invalid reporting period: {}", s)),
        }
    }
}

/// How long a cached payload stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefreshInterval {
    /// Fetched once, never refreshed
    Never,
    /// Refreshed every calendar day
    #[default]
    Daily,
    /// Refreshed every ISO week
    Weekly,
    /// Refreshed every calendar month
    Monthly,
}

impl RefreshInterval {
    /// Start of the refresh bucket containing `today`.
    ///
    /// Returns `None` for [`RefreshInterval::Never`], which has no bucket.
    pub fn bucket_start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            RefreshInterval::Never => None,
            RefreshInterval::Daily => Some(today),
            RefreshInterval::Weekly => {
                let offset = today.weekday().num_days_from_monday() as i64;
                Some(today - Duration::days(offset))
            }
            RefreshInterval::Monthly => today.with_day(1),
        }
    }

    /// Stamp used in cache file names.
    pub fn stamp(&self, today: NaiveDate) -> String {
        match self.bucket_start(today) {
            Some(start) => start.format("%Y-%m-%d").to_string(),
            None => "static".to_string(),
        }
    }
}

impl fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RefreshInterval::Never => "never",
            RefreshInterval::Daily => "daily",
            RefreshInterval::Weekly => "weekly",
            RefreshInterval::Monthly => "monthly",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RefreshInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "never" | "none" => Ok(RefreshInterval::Never),
            "daily" | "day" | "1d" => Ok(RefreshInterval::Daily),
            "weekly" | "week" | "1w" => Ok(RefreshInterval::Weekly),
            "monthly" | "month" => Ok(RefreshInterval::Monthly),
            _ => Err(format!("Invalid refresh interval: {}", s)),
        }
    }
}
