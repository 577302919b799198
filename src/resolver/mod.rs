//! Fallback resolution engine
//!
//! For each commodity, an optional operator override and then the configured
//! sources are tried strictly in order. The first value that survives
//! normalization and the plausibility gate wins; otherwise the previously
//! persisted value is carried forward. Every outcome is tagged with its
//! provenance.

mod cancel;
mod chain;
pub mod gate;
mod normalize;
mod overrides;
mod run;
mod types;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use chain::{ChainState, Step};
pub use normalize::Normalizer;
pub use overrides::{Overrides, DEFAULT_OVERRIDE_PREFIX};
pub use run::{CommodityChain, FallbackResolver, DEFAULT_CONCURRENCY};
pub use types::{Attempt, Provenance, Resolution, ResolvedPrice, RESERVED_PROVENANCE};
