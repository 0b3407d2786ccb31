//! Candidate finders: end-to-end screening pipelines.
//!
//! A finder selects a universe, fetches data through a [`FinderContext`],
//! chains screens and factors from `screener-screens`, scores the
//! survivors and writes its results. Finders are built by name through
//! the [`FinderRegistry`].

mod context;
mod finder;
mod outlook;
mod ranking;
mod registry;
mod report;
mod scoring;

mod biggest_winner;
mod blue_chip;
mod bo_score;
mod deep_discount;
mod estimated_growth;
mod inst_own;
mod meta;
mod one_week_momentum;
mod overvalued_biotech;
mod overvalued_stock;
mod penny_stock;
mod price_target;
mod value_stock;

#[cfg(test)]
mod testing;

pub use context::FinderContext;
pub use finder::{Finder, FinderConfig};
pub use ranking::{economic_moat_scores, rank_candidates, MOAT_FACTORS};
pub use registry::{FinderInfo, FinderRegistry};
pub use report::FinderReport;

pub use biggest_winner::{BiggestWinnerConfig, BiggestWinnerFinder};
pub use blue_chip::{BlueChipConfig, BlueChipFinder};
pub use bo_score::{BoScoreConfig, BoScoreFinder, BO_SCORE_FACTORS};
pub use deep_discount::{DeepDiscountConfig, DeepDiscountFinder};
pub use estimated_growth::{
    default_growth_industries, EstimatedGrowthConfig, EstimatedGrowthFinder, ESTIMATED_GROWTH_WEIGHTS,
};
pub use inst_own::{InstOwnConfig, InstOwnFinder};
pub use meta::{MetaFinder, MetaFinderConfig};
pub use one_week_momentum::{OneWeekMomentumConfig, OneWeekMomentumFinder};
pub use overvalued_biotech::{OvervaluedBiotechConfig, OvervaluedBiotechFinder};
pub use overvalued_stock::{OvervaluedStockConfig, OvervaluedStockFinder};
pub use penny_stock::{PennyStockConfig, PennyStockFinder};
pub use price_target::{PriceTargetFinder, PriceTargetFinderConfig};
pub use value_stock::{ValueStockConfig, ValueStockFinder};
