//! Resolver output types

use crate::commodity::Commodity;
use crate::source::SourceError;
use crate::units::CanonicalUnit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tags reserved for non-source provenance
pub const RESERVED_PROVENANCE: &[&str] = &["override", "previous_commit", "none"];

/// Which source, or fallback mechanism, supplied a value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Provenance {
    /// Accepted from the source with this id
    Source(String),
    /// Operator-supplied value
    Override,
    /// Carried forward from the last persisted run
    PreviousCommit,
    /// Nothing available
    None,
}

impl Provenance {
    pub fn as_str(&self) -> &str {
        match self {
            Provenance::Source(id) => id,
            Provenance::Override => "override",
            Provenance::PreviousCommit => "previous_commit",
            Provenance::None => "none",
        }
    }

    /// Value came from this run rather than a fallback
    pub fn is_fresh(&self) -> bool {
        matches!(self, Provenance::Source(_) | Provenance::Override)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Provenance {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "override" => Provenance::Override,
            "previous_commit" => Provenance::PreviousCommit,
            "none" => Provenance::None,
            _ => Provenance::Source(tag),
        }
    }
}

impl From<Provenance> for String {
    fn from(provenance: Provenance) -> Self {
        provenance.as_str().to_string()
    }
}

/// Final value for one commodity in one run, always in the canonical unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrice {
    pub commodity_id: String,
    pub value: Option<f64>,
    pub unit: CanonicalUnit,
    pub provenance: Provenance,
    pub resolved_at: DateTime<Utc>,
}

impl ResolvedPrice {
    pub fn new(commodity: &Commodity, value: Option<f64>, provenance: Provenance) -> Self {
        Self {
            commodity_id: commodity.id.clone(),
            value,
            unit: commodity.canonical_unit.clone(),
            provenance,
            resolved_at: Utc::now(),
        }
    }
}

/// One step of a chain and how it ended
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    /// Source id, or `override`
    pub source: String,
    /// Canonical value on acceptance
    pub outcome: Result<f64, SourceError>,
}

impl Attempt {
    /// Short label for metrics
    pub fn outcome_label(&self) -> &'static str {
        match &self.outcome {
            Ok(_) => "accepted",
            Err(e) => e.kind(),
        }
    }
}

/// Result of resolving one commodity
#[derive(Debug, Clone)]
pub struct Resolution {
    pub price: ResolvedPrice,
    pub attempts: Vec<Attempt>,
    /// The run was cancelled before the chain finished
    pub cancelled: bool,
}
