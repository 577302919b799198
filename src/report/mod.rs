//! Output document
//!
//! One JSON document per run: resolved prices keyed by commodity id, the
//! provenance of each, the FX table used and derived benchmark values. The
//! same document is read back as the next run's source of previous values.

mod derived;

pub use derived::{derive_benchmark, Benchmark, DerivedSpec};

use crate::fx::FxRates;
use crate::resolver::{Provenance, Resolution, ResolvedPrice};
use crate::units::CanonicalUnit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// The persisted run document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
    #[serde(default)]
    pub run_id: Option<Uuid>,
    /// Engine-wide default unit; per-commodity units are on each price
    #[serde(default)]
    pub canonical_unit: Option<CanonicalUnit>,
    #[serde(default)]
    pub prices: BTreeMap<String, ResolvedPrice>,
    /// Commodity id to provenance tag
    #[serde(default)]
    pub sources_used: BTreeMap<String, String>,
    #[serde(default)]
    pub fx: Option<FxRates>,
    #[serde(default)]
    pub benchmarks: BTreeMap<String, Benchmark>,
}

impl RunReport {
    /// Finite stored values by commodity id
    pub fn previous_values(&self) -> HashMap<String, f64> {
        self.prices
            .iter()
            .filter_map(|(id, price)| {
                price
                    .value
                    .filter(|v| v.is_finite())
                    .map(|v| (id.clone(), v))
            })
            .collect()
    }

    /// Replace the entry for a resolved commodity
    pub fn record(&mut self, price: ResolvedPrice) {
        self.sources_used
            .insert(price.commodity_id.clone(), price.provenance.to_string());
        self.prices.insert(price.commodity_id.clone(), price);
    }

    /// Stamp run metadata and recompute benchmarks from the current prices
    pub fn finish(
        &mut self,
        run_id: Uuid,
        canonical_unit: CanonicalUnit,
        fx: Option<FxRates>,
        derived: &[DerivedSpec],
    ) {
        self.as_of = Some(Utc::now());
        self.run_id = Some(run_id);
        self.canonical_unit = Some(canonical_unit);
        if fx.is_some() {
            self.fx = fx;
        }
        self.benchmarks = derived
            .iter()
            .map(|spec| {
                let value = self
                    .prices
                    .get(&spec.from)
                    .and_then(|price| derive_benchmark(spec, price, self.fx.as_ref()));
                (spec.id.clone(), Benchmark::new(spec, value))
            })
            .collect();
    }

    /// Counts of fresh, carried-forward and missing prices among `resolutions`
    pub fn summarize(resolutions: &[Resolution]) -> RunSummary {
        let mut summary = RunSummary::default();
        for resolution in resolutions {
            match &resolution.price.provenance {
                p if p.is_fresh() => summary.fresh += 1,
                Provenance::PreviousCommit => summary.carried_forward += 1,
                _ => summary.missing += 1,
            }
        }
        summary
    }
}

/// Totals logged at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fresh: usize,
    pub carried_forward: usize,
    pub missing: usize,
}
