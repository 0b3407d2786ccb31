//! Screener configuration trait and validation helpers.

use screener_core::error::StatsError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Configuration shared by every screener.
///
/// Configs are plain serde structs so they can be listed as JSON by the
/// registry and overridden from the application config file.
pub trait ScreenConfig: Serialize + DeserializeOwned + Default {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StatsError>;
}

pub(crate) fn ensure_nonzero(name: &str, value: usize) -> Result<(), StatsError> {
    if value == 0 {
        return Err(StatsError::InvalidParameter(format!(
            "{} must be greater than 0",
            name
        )));
    }
    Ok(())
}

pub(crate) fn ensure_finite(name: &str, value: Option<f64>) -> Result<(), StatsError> {
    match value {
        Some(v) if !v.is_finite() => Err(StatsError::InvalidParameter(format!(
            "{} must be a finite number",
            name
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn ensure_non_negative(name: &str, value: f64) -> Result<(), StatsError> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(StatsError::InvalidParameter(format!(
            "{} must be a non-negative number",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers() {
        assert!(ensure_nonzero("periods", 0).is_err());
        assert!(ensure_nonzero("periods", 4).is_ok());
        assert!(ensure_finite("min", Some(f64::NAN)).is_err());
        assert!(ensure_finite("min", None).is_ok());
        assert!(ensure_non_negative("k", -1.0).is_err());
        assert!(ensure_non_negative("k", f64::INFINITY).is_err());
        assert!(ensure_non_negative("k", 3.0).is_ok());
    }
}
