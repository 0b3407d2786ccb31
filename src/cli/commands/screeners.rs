//! List screeners command.

use anyhow::Result;
use screener_screens::ScreenerRegistry;

pub async fn run() -> Result<()> {
    let registry = ScreenerRegistry::new();

    println!("Available Screeners");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for (key, info) in registry.list() {
        println!("  {} ({})", info.name, key);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        if info.default_config.as_object().is_some_and(|o| !o.is_empty()) {
            println!("  Defaults: {}", info.default_config);
        }
        println!();
    }

    Ok(())
}
