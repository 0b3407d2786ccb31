//! Finder trait and configuration checks.

use async_trait::async_trait;
use screener_core::error::{FinderError, ScreenerResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{FinderContext, FinderReport};

/// An end-to-end screening pipeline.
#[async_trait]
pub trait Finder: Send + Sync {
    /// Registry key of the finder.
    fn name(&self) -> &str;

    /// Run the pipeline and write its outputs.
    async fn run(&self, ctx: &FinderContext) -> ScreenerResult<FinderReport>;
}

/// Configuration of a finder.
pub trait FinderConfig: Serialize + DeserializeOwned + Default {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), FinderError>;
}

pub(crate) fn ensure_positive_days(name: &str, days: i64) -> Result<(), FinderError> {
    if days <= 0 {
        return Err(FinderError::InvalidConfig(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

pub(crate) fn ensure_nonzero(name: &str, value: usize) -> Result<(), FinderError> {
    if value == 0 {
        return Err(FinderError::InvalidConfig(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<(), FinderError> {
    if !value.is_finite() {
        return Err(FinderError::InvalidConfig(format!(
            "{} must be a finite number",
            name
        )));
    }
    Ok(())
}

pub(crate) fn ensure_file_name(name: &str, value: &str) -> Result<(), FinderError> {
    if value.trim().is_empty() || value.contains(['/', '\\']) {
        return Err(FinderError::InvalidConfig(format!(
            "{} must be a plain file name",
            name
        )));
    }
    Ok(())
}
