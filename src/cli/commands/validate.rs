//! Validate configuration command.

use anyhow::Result;
use screener_config::AppConfig;
use std::path::Path;

pub async fn run(config_path: &Path, loaded: Result<AppConfig>) -> Result<()> {
    println!("Validating configuration: {:?}", config_path);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            println!("Configuration error: {:#}", e);
            return Err(e);
        }
    };
    if let Err(e) = config.validate() {
        println!("Configuration error: {}", e);
        return Err(e.into());
    }

    println!("Configuration is valid!");
    println!();
    println!("App: {}", config.app.name);
    println!("Environment: {}", config.app.environment);
    println!("Log level: {}", config.logging.level);
    println!("Results dir: {}", config.paths.results_dir.display());
    println!("FMP calls per minute: {}", config.fmp.calls_per_minute);
    println!("Universe limit: {}", config.universe.limit);
    println!("AI enabled: {}", config.ai.enabled);
    println!("B/O score schedule: {}", config.schedule.bo_score);
    println!("Cleanup schedule: {}", config.schedule.cleanup);

    Ok(())
}
