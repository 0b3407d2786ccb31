//! Scoring statistics for the screeners.
//!
//! This crate provides the small set of numeric transforms every ranking
//! pipeline is built from:
//! - Descriptive statistics (mean, sample standard deviation, coefficient of variation)
//! - Column scaling (min-max normalization, outlier capping)
//! - Series trends (percentage change, least-squares slope)
//!
//! Table-level helpers apply the column transforms to a `ScoreTable`.

pub mod descriptive;
pub mod scaling;
pub mod trend;

pub use descriptive::{coefficient_of_variation, mean, sample_std_dev};
pub use scaling::{
    cap_column_outliers, cap_outliers, min_max, normalize_columns, normalize_table,
    DEFAULT_OUTLIER_STD_MULTIPLIER,
};
pub use trend::{linear_slope, pct_change, LinearTrend, PctChange};
