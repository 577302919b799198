//! Two consecutive runs through the JSON store

use crate::common::{adapters, commodity, context, MockFetcher};
use lme_prices::report::{DerivedSpec, RunReport, RunSummary};
use lme_prices::resolver::{CancelSignal, CommodityChain, FallbackResolver, Normalizer, Provenance};
use lme_prices::source::{AdapterKind, SourceSpec};
use lme_prices::store::{load_previous_values, JsonFileStore, PriceStore};
use lme_prices::units::{CanonicalUnit, MassUnit, LB_PER_KG};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

const FEED: &str = "https://feed.test/latest";

fn resolver(fetcher: &Arc<MockFetcher>) -> FallbackResolver {
    let ctx = context(fetcher);
    let feed = || vec![SourceSpec::new("feed", AdapterKind::Json, FEED).with_unit("USD/kg")];
    FallbackResolver::new(
        vec![
            CommodityChain::new(
                commodity("CU", &["copper"], MassUnit::Kilogram, [3.0, 20.0]),
                adapters(feed(), &ctx),
            ),
            CommodityChain::new(
                commodity("SN", &["tin"], MassUnit::Kilogram, [15.0, 60.0]),
                adapters(feed(), &ctx),
            ),
        ],
        Normalizer::default(),
    )
}

async fn run_once(store: &JsonFileStore, fetcher: &Arc<MockFetcher>, derived: &[DerivedSpec]) -> (RunReport, RunSummary) {
    let resolver = resolver(fetcher);
    let previous = load_previous_values(store, ["CU", "SN"]).await;
    let resolutions = resolver.resolve_all(&previous, None, &CancelSignal::never()).await;
    for resolution in &resolutions {
        store
            .save(&resolution.price.commodity_id, &resolution.price)
            .await
            .unwrap();
    }
    let report = store
        .commit(|doc| doc.finish(Uuid::new_v4(), CanonicalUnit::usd_per(MassUnit::Kilogram), None, derived))
        .await
        .unwrap();
    (report, RunReport::summarize(&resolutions))
}

#[tokio::test]
async fn test_second_run_carries_forward_first_run_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data").join("prices.json");
    let derived = vec![DerivedSpec {
        id: "copper_usd_lb".to_string(),
        from: "CU".to_string(),
        unit: CanonicalUnit::usd_per(MassUnit::Pound),
    }];

    let healthy = Arc::new(MockFetcher::new().json(FEED, json!({"prices": {"copper": 9.6055}})));
    let store = JsonFileStore::open(&path).await.unwrap();
    let (first, summary) = run_once(&store, &healthy, &derived).await;

    assert_eq!(summary, RunSummary { fresh: 1, carried_forward: 0, missing: 1 });
    assert_eq!(first.sources_used.get("CU").map(String::as_str), Some("feed"));
    assert_eq!(first.sources_used.get("SN").map(String::as_str), Some("none"));
    let benchmark = first.benchmarks.get("copper_usd_lb").unwrap();
    assert!((benchmark.value.unwrap() - 9.6055 / LB_PER_KG).abs() < 1e-9);
    assert!(path.exists());
    assert!(!dir.path().join("data").join(".prices.json.tmp").exists());

    let down = Arc::new(MockFetcher::new().status(FEED, 502));
    let store = JsonFileStore::open(&path).await.unwrap();
    assert_eq!(store.load_previous("CU").await, Some(9.6055));
    assert_eq!(store.load_previous("SN").await, None);
    let (second, summary) = run_once(&store, &down, &derived).await;

    assert_eq!(summary, RunSummary { fresh: 0, carried_forward: 1, missing: 1 });
    let copper = second.prices.get("CU").unwrap();
    assert_eq!(copper.value, Some(9.6055));
    assert_eq!(copper.provenance, Provenance::PreviousCommit);
    assert_ne!(first.run_id, second.run_id);

    let on_disk: RunReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, second);
}

#[tokio::test]
async fn test_corrupt_document_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prices.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonFileStore::open(&path).await.unwrap();
    assert!(store.previous_values().await.is_empty());

    let fetcher = Arc::new(MockFetcher::new().json(FEED, json!({"prices": {"tin": {"price": 31.2, "unit": "USD/kg"}}})));
    let (report, _) = run_once(&store, &fetcher, &[]).await;
    assert_eq!(report.prices.get("SN").and_then(|p| p.value), Some(31.2));
    assert!(report.benchmarks.is_empty());
}
