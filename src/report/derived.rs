//! Derived benchmark values

use crate::fx::FxRates;
use crate::resolver::ResolvedPrice;
use crate::units::CanonicalUnit;
use serde::{Deserialize, Serialize};

/// A resolved commodity re-expressed in another unit, e.g. gold in TRY/g
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSpec {
    pub id: String,
    /// Commodity id the value is derived from
    pub from: String,
    pub unit: CanonicalUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub value: Option<f64>,
    pub unit: CanonicalUnit,
    pub from: String,
}

impl Benchmark {
    pub fn new(spec: &DerivedSpec, value: Option<f64>) -> Self {
        Self {
            value,
            unit: spec.unit.clone(),
            from: spec.from.clone(),
        }
    }
}

/// Convert a resolved price to the benchmark unit. Absent when the price is
/// absent or a needed FX rate is missing.
pub fn derive_benchmark(spec: &DerivedSpec, price: &ResolvedPrice, fx: Option<&FxRates>) -> Option<f64> {
    let value = price.value.filter(|v| v.is_finite())?;
    let per_mass = price.unit.mass.convert_price(value, spec.unit.mass);

    if price.unit.currency == spec.unit.currency {
        return Some(per_mass);
    }
    fx?.convert(per_mass, &price.unit.currency, &spec.unit.currency)
}
