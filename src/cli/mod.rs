//! CLI definitions.

pub mod commands;
pub mod setup;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "screener")]
#[command(author, version, about = "Batch stock screening and candidate ranking")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Log level
    #[arg(short, long, default_value = "info")]
    pub log_level: LogLevel,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a candidate finder
    Run(RunArgs),
    /// List available finders
    Finders,
    /// List available screeners and factors
    Screeners,
    /// Generate HTML company reports
    Report(ReportArgs),
    /// Run the scheduled jobs until interrupted
    Schedule,
    /// Delete old log files
    Cleanup,
    /// Validate configuration
    ValidateConfig,
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Finder to run (see `finders`)
    pub finder: String,

    /// Finder configuration file (JSON); missing fields use defaults
    #[arg(long)]
    pub finder_config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args)]
pub struct ReportArgs {
    /// Symbols to report on
    #[arg(required = true)]
    pub symbols: Vec<String>,

    /// Subdirectory of the reports directory
    #[arg(long, default_value = "company")]
    pub subdir: String,
}
