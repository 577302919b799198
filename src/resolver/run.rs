//! Fallback resolution runs

use super::{gate, Attempt, CancelSignal, ChainState, Normalizer, Overrides, Provenance, Resolution, ResolvedPrice, Step};
use crate::commodity::Commodity;
use crate::extract::RawQuote;
use crate::source::{SourceAdapter, SourceError};
use crate::telemetry;
use futures_util::stream::{self, StreamExt};
use std::collections::HashMap;
use std::time::Instant;

/// Commodities resolved at once when not configured
pub const DEFAULT_CONCURRENCY: usize = 4;

/// A commodity and its ordered sources
pub struct CommodityChain {
    pub commodity: Commodity,
    adapters: Vec<Box<dyn SourceAdapter>>,
}

impl CommodityChain {
    /// Sources with an explicit priority run first, lowest first; the rest
    /// keep their given order.
    pub fn new(commodity: Commodity, mut adapters: Vec<Box<dyn SourceAdapter>>) -> Self {
        adapters.sort_by_key(|adapter| adapter.spec().priority.unwrap_or(i32::MAX));
        Self { commodity, adapters }
    }

    pub fn adapters(&self) -> &[Box<dyn SourceAdapter>] {
        &self.adapters
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }
}

/// Resolves every configured commodity through its fallback chain
pub struct FallbackResolver {
    chains: Vec<CommodityChain>,
    normalizer: Normalizer,
    overrides: Overrides,
    concurrency: usize,
}

impl FallbackResolver {
    pub fn new(chains: Vec<CommodityChain>, normalizer: Normalizer) -> Self {
        Self {
            chains,
            normalizer,
            overrides: Overrides::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn chains(&self) -> &[CommodityChain] {
        &self.chains
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Resolve one commodity.
    ///
    /// Sources are tried strictly in order and each at most once. On
    /// exhaustion or cancellation, `previous` is carried forward.
    pub async fn resolve(&self, chain: &CommodityChain, previous: Option<f64>, cancel: &CancelSignal) -> Resolution {
        let commodity = &chain.commodity;
        let sources = chain.adapters.len();
        let override_quote = self.overrides.get(&commodity.id);

        let mut state = ChainState::Pending.begin(override_quote.is_some(), sources);
        let mut attempts = Vec::new();
        let mut cancelled = false;

        while let ChainState::Trying(step) = state {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let (source, provenance, outcome) = match step {
                Step::Override => {
                    let outcome = match override_quote {
                        Some(quote) => self.admit(&with_canonical_hint(quote, commodity), commodity, None),
                        None => Err(SourceError::Unavailable("override".to_string())),
                    };
                    ("override".to_string(), Provenance::Override, outcome)
                }
                Step::Source(index) => {
                    let adapter = &chain.adapters[index];
                    let started = Instant::now();
                    let fetched = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            cancelled = true;
                            break;
                        }
                        fetched = adapter.fetch(commodity) => fetched,
                    };
                    telemetry::record_fetch_latency(adapter.id(), started.elapsed());

                    let outcome = fetched
                        .and_then(|quote| self.admit(&quote, commodity, adapter.spec().currency.as_deref()));
                    let id = adapter.id().to_string();
                    (id.clone(), Provenance::Source(id), outcome)
                }
            };

            log_attempt(commodity, &source, &outcome);
            let attempt = Attempt { source, outcome };
            telemetry::record_attempt(&attempt.source, attempt.outcome_label());

            state = match &attempt.outcome {
                Ok(value) => state.accept(*value, provenance),
                Err(_) => state.reject(sources),
            };
            attempts.push(attempt);
        }

        let price = match state {
            ChainState::Accepted { value, provenance } => {
                tracing::info!(
                    commodity = %commodity.id,
                    value,
                    unit = %commodity.canonical_unit,
                    provenance = %provenance,
                    "Price resolved"
                );
                ResolvedPrice::new(commodity, Some(value), provenance)
            }
            _ => fall_back(commodity, previous, cancelled),
        };
        telemetry::record_resolution(&commodity.id, price.provenance.as_str());

        Resolution {
            price,
            attempts,
            cancelled,
        }
    }

    /// Resolve all chains (or those named in `only`) with bounded concurrency.
    ///
    /// Results come back in configuration order regardless of completion order.
    pub async fn resolve_all(
        &self,
        previous: &HashMap<String, f64>,
        only: Option<&[String]>,
        cancel: &CancelSignal,
    ) -> Vec<Resolution> {
        let selected: Vec<(usize, &CommodityChain)> = self
            .chains
            .iter()
            .enumerate()
            .filter(|(_, chain)| {
                only.map_or(true, |ids| {
                    ids.iter().any(|id| id.eq_ignore_ascii_case(&chain.commodity.id))
                })
            })
            .collect();

        tracing::info!(
            commodities = selected.len(),
            concurrency = self.concurrency,
            "Starting resolution run"
        );

        let mut results: Vec<(usize, Resolution)> = stream::iter(selected)
            .map(|(index, chain)| async move {
                let previous = previous.get(&chain.commodity.id).copied();
                (index, self.resolve(chain, previous, cancel).await)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, resolution)| resolution).collect()
    }

    fn admit(&self, quote: &RawQuote, commodity: &Commodity, currency: Option<&str>) -> Result<f64, SourceError> {
        let value = self.normalizer.normalize(quote, commodity, currency)?;
        gate::check(value, &commodity.range)
    }
}

/// Overrides without a unit are taken to be in the canonical unit
fn with_canonical_hint(quote: &RawQuote, commodity: &Commodity) -> RawQuote {
    match quote.unit_hint {
        Some(_) => quote.clone(),
        None => RawQuote::new(quote.value, Some(commodity.canonical_unit.to_string())),
    }
}

fn fall_back(commodity: &Commodity, previous: Option<f64>, cancelled: bool) -> ResolvedPrice {
    match previous.filter(|v| v.is_finite()) {
        Some(value) => {
            tracing::warn!(
                commodity = %commodity.id,
                value,
                cancelled,
                "No source accepted, carrying previous value forward"
            );
            ResolvedPrice::new(commodity, Some(value), Provenance::PreviousCommit)
        }
        None => {
            tracing::warn!(
                commodity = %commodity.id,
                cancelled,
                "No source accepted and no previous value"
            );
            ResolvedPrice::new(commodity, None, Provenance::None)
        }
    }
}

fn log_attempt(commodity: &Commodity, source: &str, outcome: &Result<f64, SourceError>) {
    match outcome {
        Ok(value) => tracing::debug!(commodity = %commodity.id, source, value, "Source accepted"),
        Err(e @ SourceError::PlausibilityRejected { .. }) => {
            tracing::warn!(commodity = %commodity.id, source, error = %e, "Implausible value rejected")
        }
        Err(e) => tracing::debug!(commodity = %commodity.id, source, error = %e, "Source unusable"),
    }
}
