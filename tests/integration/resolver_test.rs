//! Fallback chains driven through real adapters over a scripted fetcher

use crate::common::{adapters, commodity, context, MockFetcher};
use lme_prices::fx::{load_rates, FxRates, FxSources};
use lme_prices::resolver::{
    cancel_pair, CancelSignal, CommodityChain, FallbackResolver, Normalizer, Overrides, Provenance,
};
use lme_prices::source::{AdapterKind, SourceSpec};
use lme_prices::units::{Currency, MassUnit};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

const SLOW: &str = "https://slow.test/zinc";
const WILD: &str = "https://wild.test/latest";
const GOOD: &str = "https://good.test/prices.csv";
const SPARE: &str = "https://spare.test/zinc";

fn zinc_sources() -> Vec<SourceSpec> {
    vec![
        SourceSpec::new("slow", AdapterKind::Json, SLOW).with_unit("USD/t"),
        SourceSpec::new("wild", AdapterKind::Json, WILD).with_unit("USD/t"),
        SourceSpec::new("good", AdapterKind::Csv, GOOD).with_unit("USD/t"),
        SourceSpec::new("spare", AdapterKind::Json, SPARE).with_unit("USD/t"),
    ]
}

#[tokio::test]
async fn test_chain_stops_at_first_plausible_source() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .hang(SLOW)
            .json(WILD, json!({"metals": {"zinc": 85000}}))
            .body(GOOD, "symbol,close\nAL,2380\nzinc,\"2,650.50\"\n")
            .json(SPARE, json!({"zinc": 2700})),
    );
    let ctx = context(&fetcher);
    let chain = CommodityChain::new(
        commodity("ZN", &["zinc"], MassUnit::Tonne, [1500.0, 6000.0]),
        adapters(zinc_sources(), &ctx),
    );
    let resolver = FallbackResolver::new(Vec::new(), Normalizer::default());

    let resolution = resolver.resolve(&chain, Some(2500.0), &CancelSignal::never()).await;

    assert_eq!(resolution.price.value, Some(2650.5));
    assert_eq!(resolution.price.provenance, Provenance::Source("good".to_string()));
    let labels: Vec<&str> = resolution.attempts.iter().map(|a| a.outcome_label()).collect();
    assert_eq!(labels, vec!["timeout", "plausibility_rejected", "accepted"]);
    assert_eq!(fetcher.calls(), vec![SLOW, WILD, GOOD]);
    assert_eq!(fetcher.call_count(SPARE), 0);
}

#[tokio::test]
async fn test_exhausted_chain_carries_previous_forward() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .status("https://a.test/copper", 503)
            .json("https://b.test/latest", json!({"data": {"nickel": 17000}})),
    );
    let ctx = context(&fetcher);
    let chain = CommodityChain::new(
        commodity("CU", &["copper"], MassUnit::Tonne, [3000.0, 15000.0]),
        adapters(
            vec![
                SourceSpec::new("a", AdapterKind::Json, "https://a.test/copper"),
                SourceSpec::new("b", AdapterKind::Json, "https://b.test/latest"),
                SourceSpec::new("c", AdapterKind::Csv, "https://c.test/down.csv"),
            ],
            &ctx,
        ),
    );
    let resolver = FallbackResolver::new(Vec::new(), Normalizer::default());

    let resolution = resolver.resolve(&chain, Some(9605.5), &CancelSignal::never()).await;

    assert_eq!(resolution.price.value, Some(9605.5));
    assert_eq!(resolution.price.provenance, Provenance::PreviousCommit);
    let labels: Vec<&str> = resolution.attempts.iter().map(|a| a.outcome_label()).collect();
    assert_eq!(labels, vec!["status", "shape_not_found", "transport"]);
}

#[tokio::test]
async fn test_missing_commodity_does_not_block_others() {
    let fetcher = Arc::new(
        MockFetcher::new()
            .json("https://feed.test/latest", json!({"prices": {"aluminium": 2380.0}})),
    );
    let ctx = context(&fetcher);
    let feed = || SourceSpec::new("feed", AdapterKind::Json, "https://feed.test/latest").with_unit("USD/t");
    let chains = vec![
        CommodityChain::new(
            commodity("AL", &["aluminum", "aluminium"], MassUnit::Tonne, [1000.0, 5000.0]),
            adapters(vec![feed()], &ctx),
        ),
        CommodityChain::new(
            commodity("SN", &["tin"], MassUnit::Tonne, [15000.0, 60000.0]),
            adapters(vec![feed()], &ctx),
        ),
        CommodityChain::new(
            commodity("PB", &["lead"], MassUnit::Tonne, [1000.0, 5000.0]),
            adapters(vec![feed()], &ctx),
        ),
    ];
    let resolver = FallbackResolver::new(chains, Normalizer::default()).with_concurrency(2);
    let previous = HashMap::from([("PB".to_string(), 2010.0)]);

    let all = resolver.resolve_all(&previous, None, &CancelSignal::never()).await;

    let ids: Vec<&str> = all.iter().map(|r| r.price.commodity_id.as_str()).collect();
    assert_eq!(ids, vec!["AL", "SN", "PB"]);
    assert_eq!(all[0].price.provenance, Provenance::Source("feed".to_string()));
    assert_eq!(all[0].price.value, Some(2380.0));
    assert_eq!(all[1].price.provenance, Provenance::None);
    assert_eq!(all[1].price.value, None);
    assert_eq!(all[2].price.provenance, Provenance::PreviousCommit);
    assert_eq!(all[2].price.value, Some(2010.0));
}

#[tokio::test]
async fn test_override_makes_no_network_calls() {
    let fetcher = Arc::new(MockFetcher::new().body(GOOD, "symbol,close\nzinc,2650.5\n"));
    let ctx = context(&fetcher);
    let chain = CommodityChain::new(
        commodity("ZN", &["zinc"], MassUnit::Tonne, [1500.0, 6000.0]),
        adapters(zinc_sources(), &ctx),
    );
    let env = HashMap::from([("PRICE_OVERRIDE_ZN".to_string(), "2.71 USD/kg".to_string())]);
    let overrides = Overrides::from_lookup("PRICE_OVERRIDE_", ["ZN"], |key| env.get(key).cloned());
    let resolver = FallbackResolver::new(Vec::new(), Normalizer::default()).with_overrides(overrides);

    let resolution = resolver.resolve(&chain, None, &CancelSignal::never()).await;

    assert_eq!(resolution.price.provenance, Provenance::Override);
    assert!((resolution.price.value.unwrap() - 2710.0).abs() < 1e-9);
    assert!(fetcher.calls().is_empty());
}

#[tokio::test]
async fn test_cancellation_falls_back_to_previous() {
    let fetcher = Arc::new(MockFetcher::new().hang(SLOW).json(SPARE, json!({"zinc": 2700})));
    let ctx = lme_prices::source::AdapterContext::new(fetcher.clone(), Duration::from_secs(30));
    let chain = CommodityChain::new(
        commodity("ZN", &["zinc"], MassUnit::Tonne, [1500.0, 6000.0]),
        adapters(
            vec![
                SourceSpec::new("slow", AdapterKind::Json, SLOW),
                SourceSpec::new("spare", AdapterKind::Json, SPARE),
            ],
            &ctx,
        ),
    );
    let resolver = FallbackResolver::new(Vec::new(), Normalizer::default());
    let (handle, signal) = cancel_pair();

    let cancel_later = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    };
    let (resolution, _) = tokio::join!(resolver.resolve(&chain, Some(2600.0), &signal), cancel_later);

    assert!(resolution.cancelled);
    assert_eq!(resolution.price.provenance, Provenance::PreviousCommit);
    assert_eq!(resolution.price.value, Some(2600.0));
    assert_eq!(fetcher.call_count(SPARE), 0);
}

#[tokio::test]
async fn test_symbol_aliases_tried_in_order() {
    let first = "https://yahoo.test/quote?symbols=PB%3DF";
    let second = "https://yahoo.test/quote?symbols=LED%3DF";
    let fetcher = Arc::new(
        MockFetcher::new()
            .json(first, json!({"quoteResponse": {"result": []}}))
            .json(
                second,
                json!({"quoteResponse": {"result": [{"symbol": "LED=F", "regularMarketPrice": 2010.25}]}}),
            ),
    );
    let ctx = context(&fetcher);
    let chain = CommodityChain::new(
        commodity("PB", &["lead"], MassUnit::Tonne, [1000.0, 5000.0]),
        adapters(
            vec![SourceSpec::new("yahoo", AdapterKind::Json, "https://yahoo.test/quote?symbols={symbol}")
                .with_symbols(&["PB=F", "LED=F"])
                .with_unit("USD/t")],
            &ctx,
        ),
    );
    let resolver = FallbackResolver::new(Vec::new(), Normalizer::default());

    let resolution = resolver.resolve(&chain, None, &CancelSignal::never()).await;

    assert_eq!(resolution.price.value, Some(2010.25));
    assert_eq!(fetcher.calls(), vec![first, second]);
    assert_eq!(resolution.attempts.len(), 1);
}

#[tokio::test]
async fn test_unhinted_per_tonne_value_scaled_for_per_kg_commodity() {
    let fetcher = Arc::new(MockFetcher::new().json("https://feed.test/latest", json!({"prices": {"copper": 9605.5}})));
    let ctx = context(&fetcher);
    let chain = CommodityChain::new(
        commodity("CU", &["copper"], MassUnit::Kilogram, [3.0, 20.0]),
        adapters(vec![SourceSpec::new("feed", AdapterKind::Json, "https://feed.test/latest")], &ctx),
    );
    let resolver = FallbackResolver::new(Vec::new(), Normalizer::default());

    let resolution = resolver.resolve(&chain, None, &CancelSignal::never()).await;

    assert!((resolution.price.value.unwrap() - 9.6055).abs() < 1e-9);
}

#[tokio::test]
async fn test_foreign_currency_page_converted_through_bulletin() {
    const BULLETIN: &str = r#"<Tarih_Date Tarih="16.10.2026" Date="10/16/2026">
  <Currency Kod="USD" CurrencyCode="USD"><Unit>1</Unit><ForexSelling>34.3017</ForexSelling></Currency>
  <Currency Kod="EUR" CurrencyCode="EUR"><Unit>1</Unit><ForexSelling>37.2500</ForexSelling></Currency>
</Tarih_Date>"#;
    let fetcher = Arc::new(
        MockFetcher::new()
            .body("https://fx.test/today.xml", BULLETIN)
            .body(
                "https://exchange.test/zinc",
                "<html><body><h1>Zinc</h1><p>Cash settlement: 2.450,00 EUR/t</p></body></html>",
            ),
    );
    let sources = FxSources {
        url: Some("https://fx.test/today.xml".to_string()),
        base: Currency::new("TRY"),
        static_rates: BTreeMap::new(),
        timeout: Duration::from_millis(200),
    };
    let fx = load_rates(fetcher.as_ref(), &sources, None).await.unwrap();
    assert_eq!(fx.as_of.as_deref(), Some("10/16/2026"));

    let ctx = context(&fetcher);
    let chain = CommodityChain::new(
        commodity("ZN", &["zinc"], MassUnit::Tonne, [1500.0, 6000.0]),
        adapters(vec![SourceSpec::new("exchange", AdapterKind::Html, "https://exchange.test/zinc")], &ctx),
    );
    let resolver = FallbackResolver::new(Vec::new(), Normalizer::new(Some(fx)));

    let resolution = resolver.resolve(&chain, None, &CancelSignal::never()).await;

    let expected = 2450.0 * 37.25 / 34.3017;
    assert!((resolution.price.value.unwrap() - expected).abs() < 1e-6);
    assert_eq!(resolution.price.provenance, Provenance::Source("exchange".to_string()));
}

#[tokio::test]
async fn test_foreign_currency_without_rates_is_unusable() {
    let fetcher = Arc::new(MockFetcher::new().body("https://exchange.test/zinc", "<p>Zinc 2.450,00 EUR/t</p>"));
    let ctx = context(&fetcher);
    let chain = CommodityChain::new(
        commodity("ZN", &["zinc"], MassUnit::Tonne, [1500.0, 6000.0]),
        adapters(vec![SourceSpec::new("exchange", AdapterKind::Html, "https://exchange.test/zinc")], &ctx),
    );
    let fx = FxRates::new(Currency::new("TRY"), "static").with_rate("USD", 34.3);
    let resolver = FallbackResolver::new(Vec::new(), Normalizer::new(Some(fx)));

    let resolution = resolver.resolve(&chain, Some(2600.0), &CancelSignal::never()).await;

    assert_eq!(resolution.attempts[0].outcome_label(), "normalization");
    assert_eq!(resolution.price.provenance, Provenance::PreviousCommit);
}
