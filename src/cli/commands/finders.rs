//! List finders command.

use anyhow::Result;
use screener_finders::FinderRegistry;

pub async fn run() -> Result<()> {
    let registry = FinderRegistry::new();

    println!("Available Finders");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for (key, info) in registry.list() {
        println!("  {} ({})", info.name, key);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        println!();
    }

    println!("Use `run <finder>` to run one; pass --finder-config to override defaults.");

    Ok(())
}
