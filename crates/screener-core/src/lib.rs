//! Core types and traits for the stock screener.
//!
//! This crate provides the foundational building blocks including:
//! - Market data records (daily bars, fundamentals, estimates, ownership)
//! - The `ScoreTable` working set that screeners filter and rank
//! - Core traits for market data sources, indicators and language models

pub mod types;
pub mod traits;
pub mod error;

pub use error::{ScreenerError, ScreenerResult};
pub use types::*;
pub use traits::*;
