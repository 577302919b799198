//! lme-prices: multi-source base metal price resolution
//!
//! This library provides the core components for:
//! - Unit and currency normalization into a canonical price basis
//! - Shape-tolerant price extraction from JSON, CSV and HTML payloads
//! - Source adapters over a pluggable fetch capability
//! - Plausibility gating and an ordered fallback chain per commodity
//! - FX tables, derived benchmarks and a last-known-good store
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod commodity;
pub mod config;
pub mod extract;
pub mod fx;
pub mod report;
pub mod resolver;
pub mod source;
pub mod store;
pub mod telemetry;
pub mod units;
