//! Commodity types

use crate::units::{CanonicalUnit, ConversionContext};
use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` sanity bound for a commodity's canonical value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct PlausibleRange {
    pub min: f64,
    pub max: f64,
}

impl PlausibleRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Finite, inside the bounds
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }

    /// Bounds are finite and ordered
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

impl From<[f64; 2]> for PlausibleRange {
    fn from([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }
}

impl From<PlausibleRange> for [f64; 2] {
    fn from(range: PlausibleRange) -> Self {
        [range.min, range.max]
    }
}

/// A tracked metal, FX or gold quantity. Immutable once built from config.
#[derive(Debug, Clone, PartialEq)]
pub struct Commodity {
    /// Stable symbol, e.g. "CU" or "XAUUSD"
    pub id: String,
    /// Ordered names used to locate the commodity in payloads, e.g. ["copper", "cu"]
    pub synonyms: Vec<String>,
    pub canonical_unit: CanonicalUnit,
    pub range: PlausibleRange,
    /// How unhinted numbers are interpreted
    pub conversion: ConversionContext,
}

impl Commodity {
    /// Build a commodity with the default conversion assumptions for its canonical unit
    pub fn new(
        id: impl Into<String>,
        synonyms: Vec<String>,
        canonical_unit: CanonicalUnit,
        range: PlausibleRange,
    ) -> Self {
        let conversion = ConversionContext::for_canonical(canonical_unit.mass);
        Self {
            id: id.into(),
            synonyms,
            canonical_unit,
            range,
            conversion,
        }
    }

    /// Override the unhinted-value assumptions
    pub fn with_conversion(mut self, conversion: ConversionContext) -> Self {
        self.conversion = conversion;
        self
    }

    /// Synonyms followed by the id itself, without duplicates
    pub fn lookup_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::with_capacity(self.synonyms.len() + 1);
        for key in self.synonyms.iter().map(String::as_str).chain([self.id.as_str()]) {
            if !keys.iter().any(|k| k.eq_ignore_ascii_case(key)) {
                keys.push(key);
            }
        }
        keys
    }
}
