//! Date parsing for provider payloads.
//!
//! The market data provider mixes plain dates, date-times and RFC 3339
//! timestamps across endpoints; every record type funnels its date fields
//! through [`parse_flexible_date`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

/// Parse various date formats into a calendar day.
pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc().date());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, format) {
            return Some(d);
        }
    }

    // Unix timestamps, seconds or milliseconds
    if let Ok(ts) = value.parse::<i64>() {
        let millis = if ts > 10_000_000_000 { ts } else { ts * 1000 };
        return DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive());
    }

    None
}

/// Serde adapter for required date fields.
pub fn flexible_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("Could not parse date: {}", raw)))
}

/// Serde adapter for optional date fields; unparseable values become `None`.
pub fn flexible_date_opt<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_flexible_date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        assert_eq!(parse_flexible_date("2024-01-15"), Some(expected));
        assert_eq!(parse_flexible_date("2024-01-15 10:30:00"), Some(expected));
        assert_eq!(parse_flexible_date("2024-01-15T10:30:00.000Z"), Some(expected));
        assert_eq!(parse_flexible_date("2024-01-15T10:30:00"), Some(expected));
        assert_eq!(parse_flexible_date("01/15/2024"), Some(expected));
        assert_eq!(parse_flexible_date("1705312800"), Some(expected));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_flexible_date(""), None);
        assert_eq!(parse_flexible_date("not a date"), None);
    }
}
