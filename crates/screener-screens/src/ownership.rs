//! Institutional ownership statistics.

use screener_core::types::{round_to, InstitutionalOwnership, ScoreRow, ScoreTable};

use crate::BySymbol;

/// Ownership columns of the newest record.
///
/// `institutional_investor_score = investors_holding_change * (1 - pcr / (1 + pcr))`,
/// so heavy put buying discounts the holder change.
pub fn ownership_row(symbol: &str, records: &[InstitutionalOwnership]) -> Option<ScoreRow> {
    let latest = records.iter().max_by_key(|r| r.date)?;

    let holding_change = latest.investors_holding_change.unwrap_or(0.0);
    let put_call = latest.put_call_ratio.unwrap_or(0.0);
    let normalized_put_call = if put_call > -1.0 {
        put_call / (1.0 + put_call)
    } else {
        0.0
    };
    let score = holding_change * (1.0 - normalized_put_call);

    Some(
        ScoreRow::new(symbol)
            .with("investors_holding", latest.investors_holding)
            .with("investors_holding_change", latest.investors_holding_change.map(|v| round_to(v, 2)))
            .with("total_invested", latest.total_invested.map(|v| round_to(v, 0)))
            .with("total_invested_change", latest.total_invested_change.map(|v| round_to(v, 2)))
            .with("investors_put_call_ratio", latest.put_call_ratio.map(|v| round_to(v, 2)))
            .with(
                "investors_put_call_ratio_change",
                latest.put_call_ratio_change.map(|v| round_to(v, 2)),
            )
            .with("institutional_investor_score", round_to(score, 2)),
    )
}

/// Ownership stats for every symbol with at least one record.
pub fn institutional_ownership(ownership: &BySymbol<Vec<InstitutionalOwnership>>) -> ScoreTable {
    let mut table = ScoreTable::new();
    for (symbol, records) in ownership {
        if let Some(row) = ownership_row(symbol, records) {
            table.push(row);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(month: u32, holding_change: f64, pcr: f64) -> InstitutionalOwnership {
        InstitutionalOwnership {
            date: NaiveDate::from_ymd_opt(2024, month, 30),
            investors_holding: Some(1200.0),
            investors_holding_change: Some(holding_change),
            total_invested: Some(1_234_567.89),
            total_invested_change: Some(-1000.456),
            put_call_ratio: Some(pcr),
            put_call_ratio_change: Some(0.123),
        }
    }

    #[test]
    fn test_newest_record_and_score() {
        let mut data = BySymbol::new();
        data.insert("AAA".to_string(), vec![record(3, 10.0, 1.0), record(6, 40.0, 0.25)]);
        data.insert("NONE".to_string(), vec![]);

        let table = institutional_ownership(&data);

        assert_eq!(table.symbols(), vec!["AAA"]);
        assert_eq!(table.number("AAA", "investors_holding_change"), Some(40.0));
        assert_eq!(table.number("AAA", "total_invested"), Some(1_234_568.0));
        assert_eq!(table.number("AAA", "total_invested_change"), Some(-1000.46));
        // npcr = 0.25 / 1.25 = 0.2
        assert_eq!(table.number("AAA", "institutional_investor_score"), Some(32.0));
    }
}
