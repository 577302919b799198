//! Prometheus metrics

use std::time::Duration;

/// Resolutions by final provenance
pub const RESOLUTIONS_TOTAL: &str = "lme_resolutions_total";
/// Source attempts by outcome
pub const SOURCE_ATTEMPTS_TOTAL: &str = "lme_source_attempts_total";
/// Wall time of one adapter fetch, including retries
pub const FETCH_LATENCY_MS: &str = "lme_fetch_latency_ms";

/// Count one finished commodity resolution
pub fn record_resolution(commodity: &str, provenance: &str) {
    ::metrics::counter!(
        RESOLUTIONS_TOTAL,
        "commodity" => commodity.to_string(),
        "provenance" => provenance.to_string()
    )
    .increment(1);
}

/// Count one source attempt; `outcome` is `accepted` or an error kind
pub fn record_attempt(source: &str, outcome: &'static str) {
    ::metrics::counter!(
        SOURCE_ATTEMPTS_TOTAL,
        "source" => source.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a fetch latency measurement
pub fn record_fetch_latency(source: &str, duration: Duration) {
    ::metrics::histogram!(FETCH_LATENCY_MS, "source" => source.to_string())
        .record(duration.as_secs_f64() * 1000.0);
}
