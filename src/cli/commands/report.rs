//! Company report command.

use anyhow::Result;
use screener_config::AppConfig;
use tracing::warn;

use crate::cli::setup::build_context;
use crate::cli::ReportArgs;

pub async fn run(args: ReportArgs, config: &AppConfig) -> Result<()> {
    let ctx = build_context(config)?;
    let generator = ctx.report_generator(&args.subdir)?;

    let symbols: Vec<String> = args.symbols.iter().map(|s| s.to_uppercase()).collect();
    let written = generator.generate_all(&symbols).await;
    for path in &written {
        println!("{}", path.display());
    }
    if written.len() < symbols.len() {
        warn!(
            requested = symbols.len(),
            written = written.len(),
            "Some reports were not generated"
        );
    }

    Ok(())
}
