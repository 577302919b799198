//! Tracked commodities
//!
//! Static configuration describing what is resolved: identifiers, the
//! synonyms used to find a commodity inside heterogeneous payloads, the
//! canonical unit and the plausibility range.

mod types;

pub use types::{Commodity, PlausibleRange};
