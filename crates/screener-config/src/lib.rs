//! Configuration management.
//!
//! Settings come from a TOML file layered with `SCREENER__`-prefixed
//! environment variables (`SCREENER__THRESHOLDS__MIN_PRICE=10`). API keys
//! are never read from the file; the file only names the variables that
//! hold them.

mod settings;

pub use settings::{
    default_biotech_industries, AiProvider, AiSettings, AppConfig, AppSettings, BoScoreWeights,
    FmpSettings, LoggingConfig, PathsConfig, ScheduleSettings, Thresholds, UniverseSettings,
};

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Tolerance when checking that weights add up to 1.0.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Semantic configuration errors found by [`AppConfig::validate`].
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("B/O score weights must sum to 1.0, got {0}")]
    WeightSum(f64),

    #[error("Invalid cron expression for {job}: {message}")]
    Schedule { job: String, message: String },

    #[error("Invalid value for {field}: {message}")]
    Value { field: String, message: String },
}

/// Load configuration from file and environment.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from(path).required(true))
        .add_source(
            Environment::with_prefix("SCREENER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize()
}

impl AppConfig {
    /// Render the configuration as TOML, e.g. to seed a new config file.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Check the values serde cannot check.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let total = self.weights.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ValidationError::WeightSum(total));
        }

        for (job, expr) in [
            ("bo_score", &self.schedule.bo_score),
            ("cleanup", &self.schedule.cleanup),
        ] {
            cron::Schedule::from_str(expr).map_err(|e| ValidationError::Schedule {
                job: job.to_string(),
                message: e.to_string(),
            })?;
        }

        if self.fmp.calls_per_minute == 0 {
            return Err(invalid("fmp.calls_per_minute", "must be greater than 0"));
        }
        if self.universe.limit == 0 {
            return Err(invalid("universe.limit", "must be greater than 0"));
        }
        if !(self.thresholds.outlier_std_multiplier > 0.0) {
            return Err(invalid("thresholds.outlier_std_multiplier", "must be positive"));
        }
        if self.thresholds.precision > 10 {
            return Err(invalid("thresholds.precision", "must be at most 10"));
        }
        if self.schedule.poll_interval_secs == 0 {
            return Err(invalid("schedule.poll_interval_secs", "must be greater than 0"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ValidationError {
    ValidationError::Value {
        field: field.to_string(),
        message: message.to_string(),
    }
}
