//! Configuration structures.

use screener_core::traits::ScreenerQuery;
use screener_data::{CacheIntervals, DEFAULT_BASE_URL, DEFAULT_CALLS_PER_MINUTE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub fmp: FmpSettings,
    #[serde(default)]
    pub cache: CacheIntervals,
    #[serde(default)]
    pub universe: UniverseSettings,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub weights: BoScoreWeights,
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
}

/// General app settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "stock-screener".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Output and cache directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub cache_dir: PathBuf,
    pub results_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub logs_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("cache"),
            results_dir: PathBuf::from("results"),
            reports_dir: PathBuf::from("reports"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

impl PathsConfig {
    /// Every configured directory.
    pub fn all(&self) -> [&PathBuf; 4] {
        [&self.cache_dir, &self.results_dir, &self.reports_dir, &self.logs_dir]
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// File name prefix of the daily log inside `paths.logs_dir`
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: Some("screener.log".to_string()),
        }
    }
}

/// Market data provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FmpSettings {
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    pub calls_per_minute: u32,
    pub timeout_secs: u64,
}

impl Default for FmpSettings {
    fn default() -> Self {
        Self {
            api_key_env: "FMP_API_KEY".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            calls_per_minute: DEFAULT_CALLS_PER_MINUTE,
            timeout_secs: 30,
        }
    }
}

/// Default industry list of the biotech universes.
pub fn default_biotech_industries() -> Vec<String> {
    [
        "Biotechnology",
        "Drug Manufacturers—Specialty & Generic",
        "Drug Manufacturers—General",
        "Diagnostics & Research",
        "Medical Devices",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Universe selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseSettings {
    pub exchanges: Vec<String>,
    pub country: Option<String>,
    pub min_market_cap: Option<f64>,
    pub min_price: Option<f64>,
    pub max_beta: Option<f64>,
    pub min_volume: Option<f64>,
    pub limit: usize,
    pub biotech_industries: Vec<String>,
}

impl Default for UniverseSettings {
    fn default() -> Self {
        Self {
            exchanges: vec!["nyse".to_string(), "nasdaq".to_string(), "amex".to_string()],
            country: Some("US".to_string()),
            min_market_cap: Some(1_000_000_000.0),
            min_price: Some(5.0),
            max_beta: None,
            min_volume: Some(100_000.0),
            limit: 3000,
            biotech_industries: default_biotech_industries(),
        }
    }
}

impl UniverseSettings {
    /// Provider screener query for this universe.
    pub fn query(&self) -> ScreenerQuery {
        ScreenerQuery {
            exchanges: self.exchanges.clone(),
            market_cap_more_than: self.min_market_cap,
            price_more_than: self.min_price,
            beta_lower_than: self.max_beta,
            volume_more_than: self.min_volume,
            country: self.country.clone(),
            limit: self.limit,
            ..Default::default()
        }
    }
}

/// Minimum criteria and numeric constants of the scoring pipelines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum last close a security should have
    pub min_price: f64,
    pub min_quality_factor: f64,
    pub min_growth_factor: f64,
    pub min_momentum_factor: f64,
    pub min_analyst_rating: f64,
    pub min_dividend_yield: f64,
    /// Annualized risk-free rate (3-month T-bill average)
    pub risk_free_rate: f64,
    /// Decimal places of written scores
    pub precision: u32,
    /// Standard deviations kept when capping outliers
    pub outlier_std_multiplier: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_price: 5.0,
            min_quality_factor: 0.0,
            min_growth_factor: 0.0,
            min_momentum_factor: 0.0,
            min_analyst_rating: 0.0,
            min_dividend_yield: 0.0,
            risk_free_rate: 0.015,
            precision: 4,
            outlier_std_multiplier: 3.0,
        }
    }
}

/// Weights of the B/O score; they should add up to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoScoreWeights {
    pub momentum: f64,
    pub growth: f64,
    pub quality: f64,
    pub analyst_ratings: f64,
    pub dividend_yield: f64,
    pub news_sentiment: f64,
    pub social_sentiment: f64,
}

impl Default for BoScoreWeights {
    fn default() -> Self {
        Self {
            momentum: 0.2,
            growth: 0.2,
            quality: 0.15,
            analyst_ratings: 0.2,
            dividend_yield: 0.2,
            news_sentiment: 0.03,
            social_sentiment: 0.02,
        }
    }
}

impl BoScoreWeights {
    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.momentum
            + self.growth
            + self.quality
            + self.analyst_ratings
            + self.dividend_yield
            + self.news_sentiment
            + self.social_sentiment
    }
}

/// Language model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    OpenAi,
    Ollama,
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub enabled: bool,
    pub provider: AiProvider,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
    /// Cache responses per prompt and day under `paths.cache_dir`
    pub cache_responses: bool,
    /// Classify news with the language model (otherwise news scores 0)
    pub classify_news: bool,
    /// Rank finder results and write economic moat notes
    pub rank_candidates: bool,
    pub max_prompt_tokens: usize,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: AiProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3".to_string(),
            cache_responses: true,
            classify_news: true,
            rank_candidates: false,
            max_prompt_tokens: 6000,
        }
    }
}

/// Cron expressions (with seconds) of the scheduled jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub bo_score: String,
    pub cleanup: String,
    /// Seconds between scheduler checks
    pub poll_interval_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            bo_score: "0 0 1 * * Mon".to_string(),
            cleanup: "0 0 1 * * Sun".to_string(),
            poll_interval_secs: 10,
        }
    }
}
