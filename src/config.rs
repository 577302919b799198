//! Configuration types for lme-prices

use crate::commodity::{Commodity, PlausibleRange};
use crate::fx::FxSources;
use crate::report::DerivedSpec;
use crate::resolver::{DEFAULT_CONCURRENCY, DEFAULT_OVERRIDE_PREFIX, RESERVED_PROVENANCE};
use crate::source::{SourceSpec, BROWSER_USER_AGENT};
use crate::telemetry::LogFormat;
use crate::units::{CanonicalUnit, ConversionContext, Currency, MassUnit};
use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub overrides: OverridesConfig,
    #[serde(default)]
    pub fx: FxConfig,
    #[serde(default)]
    pub renderer: Option<RendererConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub commodities: Vec<CommodityConfig>,
    #[serde(default)]
    pub derived: Vec<DerivedSpec>,
}

/// Resolution engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Unit every commodity resolves to unless it sets its own
    #[serde(default = "default_canonical_unit")]
    pub canonical_unit: CanonicalUnit,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Commodities resolved concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Cancel the whole run after this many seconds
    #[serde(default)]
    pub run_deadline_secs: Option<u64>,

    /// User agent for HTML and CSV sources
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_canonical_unit() -> CanonicalUnit {
    CanonicalUnit::usd_per(MassUnit::Kilogram)
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}
fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canonical_unit: default_canonical_unit(),
            request_timeout_secs: default_request_timeout_secs(),
            concurrency: default_concurrency(),
            run_deadline_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Last-known-good store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/prices.json")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// Operator override configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OverridesConfig {
    /// Key prefix, e.g. `PRICE_OVERRIDE_` for `PRICE_OVERRIDE_CU`
    #[serde(default = "default_env_prefix")]
    pub env_prefix: String,

    /// Optional dotenv file loaded before overrides are read
    #[serde(default)]
    pub env_file: Option<PathBuf>,
}

fn default_env_prefix() -> String {
    DEFAULT_OVERRIDE_PREFIX.to_string()
}

impl Default for OverridesConfig {
    fn default() -> Self {
        Self {
            env_prefix: default_env_prefix(),
            env_file: None,
        }
    }
}

/// FX rate configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FxConfig {
    /// TCMB-style `today.xml` bulletin
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_fx_base")]
    pub base: String,

    /// Units of base per one unit of currency, used for gaps
    #[serde(default)]
    pub rates: BTreeMap<String, f64>,
}

fn default_fx_base() -> String {
    "TRY".to_string()
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            url: None,
            base: default_fx_base(),
            rates: BTreeMap::new(),
        }
    }
}

/// External page renderer
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    pub program: String,
    /// `{url}` is replaced by the page URL
    #[serde(default)]
    pub args: Vec<String>,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus exporter port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

/// One tracked commodity and its ordered sources
#[derive(Debug, Clone, Deserialize)]
pub struct CommodityConfig {
    pub id: String,

    #[serde(default)]
    pub synonyms: Vec<String>,

    /// Inclusive `[min, max]` in the canonical unit
    pub range: PlausibleRange,

    /// Overrides `engine.canonical_unit`
    #[serde(default)]
    pub canonical_unit: Option<CanonicalUnit>,

    /// Mass unit assumed for values that arrive without one
    #[serde(default)]
    pub assumed_unit: Option<String>,

    /// Unhinted values above this are taken as per-tonne
    #[serde(default)]
    pub heuristic_threshold: Option<f64>,

    #[serde(default)]
    pub sources: Vec<SourceSpec>,
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.canonicalize_ids();
        config.validate()?;
        Ok(config)
    }

    /// Trim commodity ids and point derived entries at the configured
    /// spelling of their commodity id
    fn canonicalize_ids(&mut self) {
        for commodity in &mut self.commodities {
            commodity.id = commodity.id.trim().to_string();
        }
        for derived in &mut self.derived {
            let from = derived.from.trim();
            derived.from = self
                .commodities
                .iter()
                .find(|c| c.id.eq_ignore_ascii_case(from))
                .map_or_else(|| from.to_string(), |c| c.id.clone());
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine.concurrency == 0 {
            bail!("engine.concurrency must be at least 1");
        }
        if !(1..=120).contains(&self.engine.request_timeout_secs) {
            bail!(
                "engine.request_timeout_secs must be between 1 and 120, got {}",
                self.engine.request_timeout_secs
            );
        }
        if self.fx.base.trim().is_empty() {
            bail!("fx.base must not be empty");
        }

        let mut ids = HashSet::new();
        for commodity in &self.commodities {
            let id = commodity.id.trim();
            if id.is_empty() {
                bail!("Commodity with empty id");
            }
            if !ids.insert(id.to_ascii_uppercase()) {
                bail!("Duplicate commodity id {}", id);
            }
            if !commodity.range.is_valid() {
                bail!(
                    "Commodity {}: invalid range [{}, {}]",
                    id,
                    commodity.range.min,
                    commodity.range.max
                );
            }
            if let Some(word) = &commodity.assumed_unit {
                if MassUnit::from_word(word).is_none() {
                    bail!("Commodity {}: unknown assumed_unit {:?}", id, word);
                }
            }
            if let Some(threshold) = commodity.heuristic_threshold {
                if threshold.is_nan() || threshold < 0.0 {
                    bail!("Commodity {}: heuristic_threshold must be a non-negative number", id);
                }
            }

            let mut source_ids = HashSet::new();
            for source in &commodity.sources {
                if source.id.trim().is_empty() {
                    bail!("Commodity {}: source with empty id", id);
                }
                if RESERVED_PROVENANCE.contains(&source.id.as_str()) {
                    bail!("Commodity {}: source id {:?} is reserved", id, source.id);
                }
                if !source_ids.insert(source.id.as_str()) {
                    bail!("Commodity {}: duplicate source id {}", id, source.id);
                }
                if source.url.trim().is_empty() {
                    bail!("Commodity {}: source {} has no url", id, source.id);
                }
            }
        }

        let mut derived_ids = HashSet::new();
        for derived in &self.derived {
            if !ids.contains(&derived.from.to_ascii_uppercase()) {
                bail!("Derived {} refers to unknown commodity {}", derived.id, derived.from);
            }
            if !derived_ids.insert(derived.id.as_str()) {
                bail!("Duplicate derived id {}", derived.id);
            }
        }

        Ok(())
    }

    /// Build a commodity from its configuration
    pub fn commodity(&self, config: &CommodityConfig) -> anyhow::Result<Commodity> {
        let unit = config
            .canonical_unit
            .clone()
            .unwrap_or_else(|| self.engine.canonical_unit.clone());

        let mut conversion = ConversionContext::for_canonical(unit.mass);
        if let Some(word) = &config.assumed_unit {
            conversion.assumed_unit_if_unknown = MassUnit::from_word(word)
                .with_context(|| format!("Commodity {}: unknown assumed_unit {:?}", config.id, word))?;
        }
        if let Some(threshold) = config.heuristic_threshold {
            conversion.large_value_threshold = Some(threshold);
        }

        Ok(
            Commodity::new(config.id.trim(), config.synonyms.clone(), unit, config.range)
                .with_conversion(conversion),
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.engine.request_timeout_secs)
    }

    pub fn run_deadline(&self) -> Option<Duration> {
        self.engine.run_deadline_secs.map(Duration::from_secs)
    }

    pub fn fx_sources(&self) -> FxSources {
        FxSources {
            url: self.fx.url.clone(),
            base: Currency::new(&self.fx.base),
            static_rates: self.fx.rates.clone(),
            timeout: self.request_timeout(),
        }
    }
}
