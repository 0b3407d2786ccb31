//! Finder registry: names, descriptions, default configurations and
//! construction by name.

use screener_core::error::FinderError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::finder::{Finder, FinderConfig};
use crate::{
    BiggestWinnerConfig, BiggestWinnerFinder, BlueChipConfig, BlueChipFinder, BoScoreConfig,
    BoScoreFinder, DeepDiscountConfig, DeepDiscountFinder, EstimatedGrowthConfig,
    EstimatedGrowthFinder, InstOwnConfig, InstOwnFinder, MetaFinder, MetaFinderConfig,
    OneWeekMomentumConfig, OneWeekMomentumFinder, OvervaluedBiotechConfig, OvervaluedBiotechFinder,
    OvervaluedStockConfig, OvervaluedStockFinder,
    PennyStockConfig, PennyStockFinder, PriceTargetFinder, PriceTargetFinderConfig,
    ValueStockConfig, ValueStockFinder,
};

type Build = fn(Value) -> Result<Box<dyn Finder>, FinderError>;

/// Information about a registered finder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderInfo {
    /// Finder name
    pub name: String,
    /// Finder description
    pub description: String,
    /// Default configuration as JSON
    pub default_config: Value,
}

struct Entry {
    info: FinderInfo,
    build: Build,
}

/// Registry of the available finders.
pub struct FinderRegistry {
    finders: HashMap<String, Entry>,
}

fn build<C, F>(value: Value, make: fn(C) -> F) -> Result<Box<dyn Finder>, FinderError>
where
    C: FinderConfig,
    F: Finder + 'static,
{
    let config: C = serde_json::from_value(value).map_err(|e| FinderError::InvalidConfig(e.to_string()))?;
    config.validate()?;
    Ok(Box::new(make(config)))
}

impl FinderRegistry {
    /// Create a registry with every built-in finder.
    pub fn new() -> Self {
        let mut registry = Self {
            finders: HashMap::new(),
        };

        registry.register::<BoScoreConfig>(
            "bo-score",
            "B/O Score",
            "Weighted momentum, growth, quality, analyst, dividend and sentiment ranking",
            |v| build(v, BoScoreFinder::new),
        );
        registry.register::<MetaFinderConfig>(
            "meta",
            "Meta Screener",
            "Biotech price target upside with revenue, ownership and valuation filters",
            |v| build(v, MetaFinder::new),
        );
        registry.register::<DeepDiscountConfig>(
            "deep-discount-growth",
            "Deep Discount Growth",
            "Russell 1000 names at least 50% off their high with accelerating growth",
            |v| build(v, DeepDiscountFinder::new),
        );
        registry.register::<BlueChipConfig>(
            "blue-chip-bargain",
            "Blue Chip Bargain",
            "S&P 500 and NASDAQ-100 names off their high with accelerating growth",
            |v| build(v, BlueChipFinder::new),
        );
        registry.register::<PriceTargetFinderConfig>(
            "price-target",
            "Price Target Candidates",
            "Discounted Russell 1000 names with target upside and EPS growth",
            |v| build(v, PriceTargetFinder::new),
        );
        registry.register::<BiggestWinnerConfig>(
            "biggest-winner",
            "Biggest Winners",
            "Top one-month performers outside biotech with analyst context",
            |v| build(v, BiggestWinnerFinder::new),
        );
        registry.register::<OneWeekMomentumConfig>(
            "one-week-momentum",
            "One Week Momentum",
            "Universe ranked by last week's return",
            |v| build(v, OneWeekMomentumFinder::new),
        );
        registry.register::<ValueStockConfig>(
            "value-stock",
            "Value Stocks",
            "Low multiples, revenue trend and price targets, written as a workbook",
            |v| build(v, ValueStockFinder::new),
        );
        registry.register::<PennyStockConfig>(
            "penny-stock",
            "Penny Stocks",
            "Sub-$4 small caps scored on margins, cash and institutional interest",
            |v| build(v, PennyStockFinder::new),
        );
        registry.register::<OvervaluedStockConfig>(
            "overvalued-stock",
            "Overvalued Stocks",
            "High-priced names with rich multiples and stalling income",
            |v| build(v, OvervaluedStockFinder::new),
        );
        registry.register::<OvervaluedBiotechConfig>(
            "overvalued-biotech",
            "Overvalued Biotech",
            "Biotech names near their 52-week high with heavy institutional put buying",
            |v| build(v, OvervaluedBiotechFinder::new),
        );
        registry.register::<EstimatedGrowthConfig>(
            "estimated-growth",
            "Estimated Growth",
            "Uptrending growth-industry names with rising revenue and income estimates",
            |v| build(v, EstimatedGrowthFinder::new),
        );
        registry.register::<InstOwnConfig>(
            "inst-own",
            "Institutional Ownership",
            "Discounted growers ranked by the change in institutional money",
            |v| build(v, InstOwnFinder::new),
        );

        registry
    }

    fn register<C: FinderConfig>(&mut self, key: &str, name: &str, description: &str, build: Build) {
        let default_config = serde_json::to_value(C::default()).unwrap_or(Value::Null);
        self.finders.insert(
            key.to_string(),
            Entry {
                info: FinderInfo {
                    name: name.to_string(),
                    description: description.to_string(),
                    default_config,
                },
                build,
            },
        );
    }

    /// List all finders, ordered by key.
    pub fn list(&self) -> Vec<(&str, &FinderInfo)> {
        let mut entries: Vec<(&str, &FinderInfo)> =
            self.finders.iter().map(|(k, v)| (k.as_str(), &v.info)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }

    /// Get finder info by key.
    pub fn get(&self, key: &str) -> Option<&FinderInfo> {
        self.finders.get(key).map(|e| &e.info)
    }

    /// Check if a finder exists.
    pub fn exists(&self, key: &str) -> bool {
        self.finders.contains_key(key)
    }

    /// Get all finder keys, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.finders.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Create a finder from a configuration.
    ///
    /// Fields missing from `config` take their defaults. The result is
    /// validated before the finder is built.
    pub fn create(&self, key: &str, config: Value) -> Result<Box<dyn Finder>, FinderError> {
        let entry = self
            .finders
            .get(key)
            .ok_or_else(|| FinderError::NotFound(key.to_string()))?;
        (entry.build)(config)
    }

    /// Create a finder with its default configuration.
    pub fn create_default(&self, key: &str) -> Result<Box<dyn Finder>, FinderError> {
        self.create(key, Value::Object(Default::default()))
    }
}

impl Default for FinderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_list() {
        let registry = FinderRegistry::new();
        let finders = registry.list();

        assert_eq!(finders.len(), 13);
        assert_eq!(finders[0].0, "biggest-winner");
        for key in [
            "value-stock",
            "penny-stock",
            "overvalued-stock",
            "overvalued-biotech",
            "estimated-growth",
            "inst-own",
        ] {
            assert!(registry.exists(key), "{} missing", key);
        }
        assert!(registry.get("backtest").is_none());
    }

    #[test]
    fn test_create_by_name() {
        let registry = FinderRegistry::new();

        for key in registry.names() {
            let finder = registry.create_default(key).unwrap();
            assert_eq!(finder.name(), key);
        }
        assert_eq!(registry.get("meta").unwrap().default_config["top_n"], 50);
    }

    #[test]
    fn test_create_errors() {
        let registry = FinderRegistry::new();

        assert!(matches!(
            registry.create_default("unknown"),
            Err(FinderError::NotFound(_))
        ));

        let invalid = serde_json::json!({"top_n": 0});
        assert!(matches!(
            registry.create("meta", invalid),
            Err(FinderError::InvalidConfig(_))
        ));

        let wrong_type = serde_json::json!({"min_bars": "many"});
        assert!(registry.create("bo-score", wrong_type).is_err());
    }
}
