//! Stock screener CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use screener_config::load_config;
use screener_monitor::{setup_logging, LogFile};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = load_config(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()));

    // Log to file only once the configuration names a log directory
    let log_file = loaded.as_ref().ok().and_then(|config| {
        let prefix = config.logging.file.as_deref()?;
        std::fs::create_dir_all(&config.paths.logs_dir).ok()?;
        Some(LogFile {
            dir: &config.paths.logs_dir,
            prefix,
        })
    });
    let json = cli.json_logs
        || loaded
            .as_ref()
            .is_ok_and(|config| config.logging.format.eq_ignore_ascii_case("json"));
    let _guard = setup_logging(cli.log_level.as_str(), json, log_file);

    if let Commands::ValidateConfig = cli.command {
        return cli::commands::validate::run(&cli.config, loaded).await;
    }
    let config = loaded?;
    config.validate().context("Invalid configuration")?;

    // Execute command
    match cli.command {
        Commands::Run(args) => cli::commands::run::run(args, &config).await,
        Commands::Finders => cli::commands::finders::run().await,
        Commands::Screeners => cli::commands::screeners::run().await,
        Commands::Report(args) => cli::commands::report::run(args, &config).await,
        Commands::Schedule => cli::commands::schedule::run(&config).await,
        Commands::Cleanup => cli::commands::cleanup::run(&config).await,
        Commands::ValidateConfig => Ok(()),
    }
}
