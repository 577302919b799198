//! Source configuration

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{env:([A-Za-z_][A-Za-z0-9_]*)\}").expect("Invalid regex"));

/// Response format of an upstream provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// JSON API, one GET per endpoint candidate
    #[serde(alias = "json_api")]
    Json,
    /// CSV feed with a header row
    Csv,
    /// HTML page scraped with text patterns
    Html,
    /// Page rendered by an external browser engine, then scraped
    Rendered,
}

/// One upstream data source for one commodity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Provenance tag recorded when this source wins
    pub id: String,
    pub kind: AdapterKind,
    /// URL template; `{symbol}` is replaced by each entry of `symbols`,
    /// `{env:NAME}` by the environment variable `NAME`
    pub url: String,
    /// Provider aliases for the same instrument, tried in order
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Unit assumed for bare price fields, e.g. "USD/lb"
    #[serde(default)]
    pub unit: Option<String>,
    /// Quote currency when the payload does not say
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Lower runs first; ties keep configuration order
    #[serde(default)]
    pub priority: Option<i32>,
    /// Extra tries for transport failures within one attempt
    #[serde(default)]
    pub retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_retry_delay_ms() -> u64 {
    1200
}

/// One concrete URL to request, and the provider symbol it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub symbol: Option<String>,
}

impl SourceSpec {
    /// Minimal spec, mostly for tests and programmatic setups
    pub fn new(id: impl Into<String>, kind: AdapterKind, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            url: url.into(),
            symbols: Vec::new(),
            unit: None,
            currency: None,
            headers: BTreeMap::new(),
            priority: None,
            retries: 0,
            retry_delay_ms: default_retry_delay_ms(),
        }
    }

    pub fn with_symbols(mut self, symbols: &[&str]) -> Self {
        self.symbols = symbols.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    /// Expand the URL template once per symbol, or once if there are none
    pub fn endpoint_candidates(&self) -> Vec<Endpoint> {
        let base = expand_env(&self.url);
        if self.symbols.is_empty() {
            return vec![Endpoint {
                url: base,
                symbol: None,
            }];
        }
        self.symbols
            .iter()
            .map(|symbol| Endpoint {
                url: base.replace("{symbol}", &encode_component(symbol)),
                symbol: Some(symbol.clone()),
            })
            .collect()
    }
}

fn expand_env(template: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

/// Form-encode a symbol for use as a query value
fn encode_component(component: &str) -> String {
    url::form_urlencoded::byte_serialize(component.as_bytes()).collect()
}
