//! Status and config output

use crate::config::Config;
use crate::store::JsonFileStore;

/// Print the stored document
pub async fn print_status(config: &Config) -> anyhow::Result<()> {
    let store = JsonFileStore::open(&config.store.path).await?;
    let document = store.document().await;

    println!("lme-prices status");
    println!("  Store: {}", store.path().display());
    match (document.as_of, document.run_id) {
        (Some(as_of), Some(run_id)) => println!("  Last run: {} ({})", as_of.to_rfc3339(), run_id),
        _ => println!("  Last run: never"),
    }

    for (id, price) in &document.prices {
        let value = price
            .value
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<8} {:>14} {:<8} {:<16} {}",
            id,
            value,
            price.unit.to_string(),
            price.provenance.to_string(),
            price.resolved_at.to_rfc3339()
        );
    }

    for (id, benchmark) in &document.benchmarks {
        let value = benchmark
            .value
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<16} {:>14} {}", id, value, benchmark.unit);
    }
    Ok(())
}

/// Print commodities with their sources in chain order
pub fn print_config(config: &Config) {
    println!("Current configuration:");
    println!(
        "  Engine: unit={}, timeout={}s, concurrency={}",
        config.engine.canonical_unit, config.engine.request_timeout_secs, config.engine.concurrency
    );
    println!("  Store: {}", config.store.path.display());
    println!("  Overrides: {}<ID>", config.overrides.env_prefix);

    for commodity in &config.commodities {
        let unit = commodity
            .canonical_unit
            .as_ref()
            .unwrap_or(&config.engine.canonical_unit);
        println!(
            "  {} [{}, {}] {}",
            commodity.id, commodity.range.min, commodity.range.max, unit
        );

        let mut sources: Vec<_> = commodity.sources.iter().collect();
        sources.sort_by_key(|s| s.priority.unwrap_or(i32::MAX));
        for (position, source) in sources.iter().enumerate() {
            println!(
                "    {}. {} ({:?}) {}",
                position + 1,
                source.id,
                source.kind,
                source.url
            );
        }
    }
}
