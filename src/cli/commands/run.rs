//! Run a finder.

use anyhow::{Context, Result};
use screener_config::AppConfig;
use screener_finders::FinderRegistry;
use serde_json::Value;
use tracing::info;

use crate::cli::setup::build_context;
use crate::cli::RunArgs;

pub async fn run(args: RunArgs, config: &AppConfig) -> Result<()> {
    let finder_config = match &args.finder_config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text).context("Finder configuration is not valid JSON")?
        }
        None => Value::Object(Default::default()),
    };

    let registry = FinderRegistry::new();
    let finder = registry
        .create(&args.finder, finder_config)
        .context("Failed to create finder")?;

    let ctx = build_context(config)?;
    info!(finder = finder.name(), as_of = %ctx.as_of(), "Starting finder");
    let report = finder.run(&ctx).await.context("Finder failed")?;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.summary());
    }

    Ok(())
}
