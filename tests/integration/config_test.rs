//! Chains built from a configuration file

use crate::common::MockFetcher;
use lme_prices::cli::build_resolver;
use lme_prices::config::Config;
use lme_prices::resolver::{CancelSignal, Provenance};
use lme_prices::units::LB_PER_KG;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

const CONFIG: &str = r#"
[engine]
canonical_unit = "USD/kg"
request_timeout_secs = 1
concurrency = 2

[overrides]
env_prefix = "LME_PRICES_IT_OVERRIDE_"

[[commodities]]
id = "CU"
synonyms = ["copper"]
range = [3.0, 20.0]

[[commodities.sources]]
id = "backup"
kind = "csv"
url = "https://backup.test/cu.csv"
unit = "USD/lb"

[[commodities.sources]]
id = "primary"
kind = "json"
url = "https://primary.test/latest"
priority = 1

[[commodities]]
id = "XAUUSD"
synonyms = ["gold"]
canonical_unit = "USD/oz"
range = [1000.0, 6000.0]

[[commodities.sources]]
id = "stooq"
kind = "csv"
url = "https://stooq.test/q/l/?s={symbol}"
symbols = ["xauusd"]
unit = "USD/oz"

[[commodities]]
id = "NI"
synonyms = ["nickel"]
range = [8.0, 50.0]

[[commodities.sources]]
id = "feed"
kind = "json"
url = "https://feed.test/nickel"

[[derived]]
id = "copper_usd_lb"
from = "CU"
unit = "USD/lb"
"#;

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, CONFIG).unwrap();
    path
}

#[tokio::test]
async fn test_config_file_drives_chains() {
    let dir = TempDir::new().unwrap();
    let config = Config::load(write_config(&dir)).unwrap();
    std::env::set_var("LME_PRICES_IT_OVERRIDE_NI", "17500 USD/t");

    let fetcher = Arc::new(
        MockFetcher::new()
            .status("https://primary.test/latest", 503)
            .body("https://backup.test/cu.csv", "symbol,close\ncopper,4.357\n")
            .body(
                "https://stooq.test/q/l/?s=xauusd",
                "Symbol,Date,Time,Open,High,Low,Close,Volume\nXAUUSD,2026-10-16,22:00:00,2650.1,2671.0,2640.2,2665.4,0\n",
            ),
    );
    let resolver = build_resolver(&config, fetcher.clone(), None).unwrap();
    let chain_ids: Vec<Vec<&str>> = resolver.chains().iter().map(|c| c.source_ids()).collect();
    assert_eq!(chain_ids, vec![vec!["primary", "backup"], vec!["stooq"], vec!["feed"]]);

    let all = resolver
        .resolve_all(&HashMap::new(), None, &CancelSignal::never())
        .await;

    let copper = &all[0].price;
    assert_eq!(copper.provenance, Provenance::Source("backup".to_string()));
    assert!((copper.value.unwrap() - 4.357 * LB_PER_KG).abs() < 1e-9);
    assert_eq!(copper.unit.to_string(), "USD/kg");

    let gold = &all[1].price;
    assert_eq!(gold.value, Some(2665.4));
    assert_eq!(gold.unit.to_string(), "USD/oz");

    let nickel = &all[2].price;
    assert_eq!(nickel.provenance, Provenance::Override);
    assert!((nickel.value.unwrap() - 17.5).abs() < 1e-9);
    assert_eq!(fetcher.call_count("https://feed.test/nickel"), 0);

    let calls = fetcher.calls();
    let primary = calls.iter().position(|u| u == "https://primary.test/latest").unwrap();
    let backup = calls.iter().position(|u| u == "https://backup.test/cu.csv").unwrap();
    assert!(primary < backup);
}

#[test]
fn test_invalid_file_reports_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, CONFIG.replace("range = [3.0, 20.0]", "range = [20.0, 3.0]")).unwrap();

    let err = Config::load(&path).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("config.toml"));
    assert!(message.contains("invalid range"));
}

#[tokio::test]
async fn test_override_keyed_by_trimmed_id() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, CONFIG.replace("id = \"NI\"", "id = \" NI \"")).unwrap();
    let config = Config::load(&path).unwrap();
    std::env::set_var("LME_PRICES_IT_OVERRIDE_NI", "17500 USD/t");

    let fetcher = Arc::new(MockFetcher::new());
    let resolver = build_resolver(&config, fetcher.clone(), None).unwrap();
    let only = vec!["NI".to_string()];
    let all = resolver
        .resolve_all(&HashMap::new(), Some(&only), &CancelSignal::never())
        .await;

    assert_eq!(all.len(), 1);
    assert_eq!(all[0].price.commodity_id, "NI");
    assert_eq!(all[0].price.provenance, Provenance::Override);
    assert_eq!(fetcher.call_count("https://feed.test/nickel"), 0);
}
