//! Cleanup command.

use anyhow::{Context, Result};
use screener_config::AppConfig;
use screener_monitor::remove_log_files;

/// Delete the rolling log files so they do not grow without bound.
pub fn perform_cleanup(config: &AppConfig) -> Result<usize> {
    let Some(prefix) = config.logging.file.as_deref() else {
        return Ok(0);
    };
    remove_log_files(&config.paths.logs_dir, prefix)
        .with_context(|| format!("Failed to clean {}", config.paths.logs_dir.display()))
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let removed = perform_cleanup(config)?;
    println!("Removed {} log file(s)", removed);
    Ok(())
}
