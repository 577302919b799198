//! FX rates
//!
//! Currency conversion goes through a shared base currency: every rate is
//! "units of base per one unit of currency", the shape of the TCMB daily
//! bulletin. Rates come from a live bulletin, then static configuration for
//! gaps, then the previous run's table.

mod tcmb;

pub use tcmb::{fetch_tcmb, parse_today_xml};

use crate::source::Fetcher;
use crate::units::{cross_convert, Currency};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// A table of base-currency rates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FxRates {
    pub base: Currency,
    /// Units of `base` per one unit of the keyed currency
    pub rates: BTreeMap<String, f64>,
    #[serde(default)]
    pub as_of: Option<String>,
    #[serde(default)]
    pub source: String,
}

impl FxRates {
    pub fn new(base: Currency, source: impl Into<String>) -> Self {
        Self {
            base,
            rates: BTreeMap::new(),
            as_of: None,
            source: source.into(),
        }
    }

    pub fn with_rate(mut self, code: &str, rate: f64) -> Self {
        self.insert(code, rate);
        self
    }

    /// Store a rate; non-positive or non-finite rates are ignored
    pub fn insert(&mut self, code: &str, rate: f64) {
        if rate.is_finite() && rate > 0.0 {
            self.rates.insert(code.trim().to_ascii_uppercase(), rate);
        }
    }

    /// Units of base per one unit of `currency`
    pub fn rate(&self, currency: &Currency) -> Option<f64> {
        if *currency == self.base {
            return Some(1.0);
        }
        self.rates.get(currency.code()).copied()
    }

    /// Convert between two currencies through the base
    pub fn convert(&self, value: f64, from: &Currency, to: &Currency) -> Option<f64> {
        if from == to {
            return value.is_finite().then_some(value);
        }
        cross_convert(value, self.rate(from), self.rate(to))
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Copy rates from `other` for currencies this table lacks
    pub fn fill_from(&mut self, other: &FxRates) {
        if other.base != self.base {
            return;
        }
        for (code, rate) in &other.rates {
            self.rates.entry(code.clone()).or_insert(*rate);
        }
    }
}

/// Where FX rates come from for one run
#[derive(Debug, Clone)]
pub struct FxSources {
    pub url: Option<String>,
    pub base: Currency,
    pub static_rates: BTreeMap<String, f64>,
    pub timeout: Duration,
}

/// Assemble the run's FX table.
///
/// A failed bulletin download is logged and the static and previous tables
/// are used instead. Returns `None` when no layer has any rate.
pub async fn load_rates(
    fetcher: &dyn Fetcher,
    sources: &FxSources,
    previous: Option<&FxRates>,
) -> Option<FxRates> {
    let mut table = FxRates::new(sources.base.clone(), "static");

    if let Some(url) = sources.url.as_deref() {
        match fetch_tcmb(fetcher, url, sources.timeout).await {
            Ok(fetched) if fetched.base == sources.base => table = fetched,
            Ok(fetched) => tracing::warn!(
                url,
                expected = %sources.base,
                got = %fetched.base,
                "FX bulletin has a different base currency, ignoring"
            ),
            Err(e) => tracing::warn!(url, error = %e, "FX bulletin unavailable"),
        }
    }

    for (code, rate) in &sources.static_rates {
        if !table.rates.contains_key(&code.to_ascii_uppercase()) {
            table.insert(code, *rate);
        }
    }

    if table.is_empty() {
        if let Some(previous) = previous.filter(|p| !p.is_empty()) {
            tracing::warn!(as_of = previous.as_of.as_deref().unwrap_or("-"), "Reusing previous FX table");
            return Some(previous.clone());
        }
        return None;
    }

    if let Some(previous) = previous {
        table.fill_from(previous);
    }
    Some(table)
}
