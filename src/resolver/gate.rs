//! Plausibility gate

use crate::commodity::PlausibleRange;
use crate::source::SourceError;

/// Finite and inside the inclusive range
pub fn accept(value: f64, range: &PlausibleRange) -> bool {
    range.contains(value)
}

/// [`accept`] as a `Result`, for threading through a chain step
pub fn check(value: f64, range: &PlausibleRange) -> Result<f64, SourceError> {
    if accept(value, range) {
        Ok(value)
    } else {
        Err(SourceError::PlausibilityRejected {
            value,
            min: range.min,
            max: range.max,
        })
    }
}
