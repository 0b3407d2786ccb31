//! Language model passes over finder results: candidate ranking and
//! economic moat ratings.

use screener_ai::clean_markdown_json;
use screener_core::traits::{MarketDataSource, TextGenerator};
use screener_core::types::{round_to, ScoreRow, ScoreTable};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Persona of the ranking prompts.
pub const ANALYST_ROLE: &str = "Financial Analyst";

/// Moat factors rated from 1 to 10.
pub const MOAT_FACTORS: [&str; 9] = [
    "first_in_class_product",
    "global_target_market",
    "platform_solution",
    "future_growth_markets",
    "large_income_changes",
    "network_effects",
    "high_switching_costs",
    "increasing_income_streams",
    "patented_technologies",
];

/// Table columns sent to the ranking prompt, with the key used in the prompt.
const RANK_INPUTS: [(&str, &str); 3] = [
    ("total_grades_rating", "total_analyst_grades_rating"),
    ("avg_price_target_change", "avg_price_target_change"),
    ("institutional_investor_score", "institutional_investor_score"),
];

/// Ask the model to rank candidates on a 0 to 1 scale.
///
/// Returns `llm_rank` and `reasoning` for every symbol of `table`. When the
/// call fails or the reply cannot be parsed every rank is 0.
pub async fn rank_candidates(generator: &dyn TextGenerator, table: &ScoreTable) -> ScoreTable {
    let records: Vec<Value> = table
        .rows()
        .iter()
        .map(|row| {
            let mut record = Map::new();
            record.insert("symbol".to_string(), Value::from(row.symbol.clone()));
            for (column, key) in RANK_INPUTS {
                let value = row.number(column).map(Value::from).unwrap_or(Value::Null);
                record.insert(key.to_string(), value);
            }
            Value::Object(record)
        })
        .collect();

    let prompt = format!(
        "Rank the following stocks by the price return you expect over the next year. \
         Weigh the provided ratings at 60% and your own knowledge of each company at 40%, \
         and explain every pick briefly. Reply with a JSON array only, formatted as \
         [{{\"symbol\": \"<symbol>\", \"llm_rank\": <rank from 0 to 1.0>, \"reasoning\": \"<reason>\"}}]. \
         Ratings: {}",
        Value::Array(records)
    );

    let ranks = match generator.generate(ANALYST_ROLE, &prompt).await {
        Ok(reply) => parse_ranks(&reply).unwrap_or_else(|| {
            warn!(reply = %reply, "Unparseable ranking reply");
            HashMap::new()
        }),
        Err(e) => {
            warn!(error = %e, "Ranking request failed");
            HashMap::new()
        }
    };

    let mut ranked = ScoreTable::with_columns(&["llm_rank", "reasoning"]);
    for symbol in table.symbols() {
        let (rank, reasoning) = ranks.get(&symbol).cloned().unwrap_or((0.0, String::new()));
        ranked.push(
            ScoreRow::new(symbol)
                .with("llm_rank", rank)
                .with("reasoning", reasoning),
        );
    }
    ranked
}

fn parse_ranks(reply: &str) -> Option<HashMap<String, (f64, String)>> {
    let items = parse_json_objects(reply)?;
    let ranks = items
        .iter()
        .filter_map(|item| {
            let symbol = item.get("symbol")?.as_str()?.to_string();
            let rank = item.get("llm_rank").and_then(json_number).unwrap_or(0.0);
            let reasoning = item
                .get("reasoning")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Some((symbol, (rank, reasoning)))
        })
        .collect();
    Some(ranks)
}

/// Rate each company's economic moat from its description.
///
/// Writes the nine factors plus `economic_moat_score`, their mean rounded
/// to 2 decimals. Symbols without a description or with an incomplete
/// reply are skipped.
pub async fn economic_moat_scores(
    generator: &dyn TextGenerator,
    source: &dyn MarketDataSource,
    symbols: &[String],
) -> ScoreTable {
    let mut columns: Vec<&str> = MOAT_FACTORS.to_vec();
    columns.push("economic_moat_score");
    let mut table = ScoreTable::with_columns(&columns);

    for symbol in symbols {
        let description = match source.company_outlook(symbol).await {
            Ok(Some(outlook)) => outlook.profile.description.unwrap_or_default(),
            Ok(None) => String::new(),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Failed to fetch company outlook");
                continue;
            }
        };
        if description.trim().is_empty() {
            debug!(symbol = %symbol, "No company description for moat analysis");
            continue;
        }

        let prompt = moat_prompt(symbol, &description);
        let reply = match generator.generate(ANALYST_ROLE, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Moat analysis request failed");
                continue;
            }
        };

        match parse_moat(symbol, &reply) {
            Some(row) => table.push(row),
            None => warn!(symbol = %symbol, reply = %reply, "Incomplete moat analysis reply"),
        }
    }

    table
}

fn moat_prompt(symbol: &str, description: &str) -> String {
    let fields: Vec<String> = MOAT_FACTORS
        .iter()
        .map(|factor| format!("\"{}\": <1 to 10>", factor))
        .collect();
    format!(
        "Rate the economic moat of this company on a scale from 1 to 10 for each factor, \
         using the description and your background knowledge. Reply with a JSON array only, \
         formatted as [{{\"symbol\": \"<symbol>\", {}}}]. Symbol: {}, Description: {}",
        fields.join(", "),
        symbol,
        description
    )
}

fn parse_moat(symbol: &str, reply: &str) -> Option<ScoreRow> {
    let items = parse_json_objects(reply)?;
    let item = items.first()?;

    let mut row = ScoreRow::new(symbol);
    let mut total = 0.0;
    for factor in MOAT_FACTORS {
        let value = item.get(factor).and_then(json_number)?;
        total += value;
        row.set(factor, value);
    }
    row.set("economic_moat_score", round_to(total / MOAT_FACTORS.len() as f64, 2));
    Some(row)
}

/// Objects of a JSON reply; a single object counts as a one-element array.
fn parse_json_objects(reply: &str) -> Option<Vec<Map<String, Value>>> {
    let value: Value = serde_json::from_str(&clean_markdown_json(reply)).ok()?;
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
        ),
        Value::Object(map) => Some(vec![map]),
        _ => None,
    }
}

/// A number, or a string holding one.
fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Failing, Scripted};
    use screener_core::types::{CompanyOutlook, CompanyProfile};
    use screener_data::InMemorySource;

    fn candidates() -> ScoreTable {
        ScoreTable::from_rows([
            ScoreRow::new("AAA")
                .with("total_grades_rating", 4_i64)
                .with("avg_price_target_change", 35.0)
                .with("institutional_investor_score", 12.0),
            ScoreRow::new("BBB")
                .with("total_grades_rating", 1_i64)
                .with("avg_price_target_change", 29.0),
        ])
    }

    #[tokio::test]
    async fn test_rank_candidates() {
        let reply = "```json\n[{\"symbol\": \"AAA\", \"llm_rank\": \"0.8\", \"reasoning\": \"Strong pipeline\"}]\n```";
        let generator = Scripted::new(reply);

        let ranked = rank_candidates(&generator, &candidates()).await;

        assert_eq!(ranked.number("AAA", "llm_rank"), Some(0.8));
        assert_eq!(
            ranked.get("AAA").and_then(|r| r.text("reasoning")),
            Some("Strong pipeline")
        );
        // Symbols the model left out rank zero
        assert_eq!(ranked.number("BBB", "llm_rank"), Some(0.0));

        let prompt = generator.last_prompt();
        assert!(prompt.contains("total_analyst_grades_rating"));
        assert!(prompt.contains("\"symbol\":\"BBB\""));
    }

    #[tokio::test]
    async fn test_rank_candidates_failures() {
        let ranked = rank_candidates(&Failing, &candidates()).await;
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked.number("AAA", "llm_rank"), Some(0.0));

        let ranked = rank_candidates(&Scripted::new("no idea"), &candidates()).await;
        assert_eq!(ranked.number("BBB", "llm_rank"), Some(0.0));
    }

    fn outlook(description: &str) -> CompanyOutlook {
        CompanyOutlook {
            profile: CompanyProfile {
                description: Some(description.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_economic_moat_scores() {
        let source = InMemorySource::new()
            .with_outlook("AAA", outlook("Gene therapy platform"))
            .with_outlook("BBB", outlook(""));
        let fields: Vec<String> = MOAT_FACTORS.iter().map(|f| format!("\"{}\": 5", f)).collect();
        let reply = format!("[{{\"symbol\": \"AAA\", {}, \"patented_technologies_note\": 1}}]", fields.join(", "))
            .replace("\"patented_technologies\": 5", "\"patented_technologies\": 8");
        let generator = Scripted::new(&reply);

        let symbols = vec!["AAA".to_string(), "BBB".to_string(), "CCC".to_string()];
        let table = economic_moat_scores(&generator, &source, &symbols).await;

        assert_eq!(table.symbols(), vec!["AAA"]);
        assert_eq!(table.number("AAA", "patented_technologies"), Some(8.0));
        // (8 * 5 + 8) / 9
        assert_eq!(table.number("AAA", "economic_moat_score"), Some(5.33));
        assert!(generator.last_prompt().contains("Gene therapy platform"));
    }

    #[test]
    fn test_parse_moat_requires_every_factor() {
        assert!(parse_moat("AAA", "[{\"symbol\": \"AAA\", \"network_effects\": 7}]").is_none());
        assert!(parse_moat("AAA", "not json").is_none());
    }
}
