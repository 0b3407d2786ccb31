//! Error types for the stock screener.

use thiserror::Error;

/// Top-level screener error.
#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),

    #[error("Finder error: {0}")]
    Finder(#[from] FinderError),

    #[error("AI client error: {0}")]
    Ai(#[from] AiError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Market data errors.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("No data available for the requested range")]
    NoDataAvailable,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Data source error: {0}")]
    Internal(String),
}

/// Statistics and indicator calculation errors.
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Insufficient data: need {required} points, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown screener: {0}")]
    UnknownScreener(String),
}

/// Candidate finder errors.
#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Finder not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Universe selection returned no symbols")]
    EmptyUniverse,

    #[error("Finder error: {0}")]
    Internal(String),
}

/// Language model client errors.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

/// Report rendering errors.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Template error: {0}")]
    Template(String),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report error: {0}")]
    Internal(String),
}

/// Result type alias for screener operations.
pub type ScreenerResult<T> = Result<T, ScreenerError>;
