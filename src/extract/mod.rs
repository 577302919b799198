//! Shape extraction
//!
//! Upstream providers rename and restructure fields without notice, so price
//! location is done by probing: container keys crossed with commodity
//! synonyms and their case variants for JSON, header-mapped rows for CSV, and
//! ordered amount/currency/unit regular expressions for HTML and plain text.
//! Absence is a normal outcome and never an error.

mod json;
mod table;
mod text;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A not-yet-normalized value as found in a payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    pub value: f64,
    pub unit_hint: Option<String>,
}

impl RawQuote {
    pub fn new(value: f64, unit_hint: Option<impl Into<String>>) -> Self {
        Self {
            value,
            unit_hint: unit_hint.map(Into::into),
        }
    }
}

/// A parsed upstream response
#[derive(Debug, Clone)]
pub enum Payload {
    /// JSON tree
    Json(Value),
    /// Comma-separated rows with a header line
    Table(String),
    /// HTML or plain text
    Text(String),
}

/// A field that may carry a price, with the unit its name implies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceField {
    pub name: String,
    /// `None` means the caller-supplied fallback unit applies
    pub unit: Option<String>,
}

impl PriceField {
    pub fn new(name: &str, unit: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.map(str::to_string),
        }
    }
}

/// Containers searched in JSON payloads. The empty path is the document root.
const DEFAULT_CONTAINERS: &[&str] = &[
    "",
    "prices",
    "metals",
    "data",
    "latest",
    "rates",
    "quotes",
    "quoteResponse.result",
];

/// Fields read from a located node, most specific first
const DEFAULT_FIELDS: &[(&str, Option<&str>)] = &[
    ("price_per_kg", Some("/kg")),
    ("usd_per_kg", Some("USD/kg")),
    ("price_per_tonne", Some("/t")),
    ("usd_per_tonne", Some("USD/t")),
    ("price_per_lb", Some("/lb")),
    ("usd_per_lb", Some("USD/lb")),
    ("price_per_oz", Some("/oz")),
    ("price", None),
    ("value", None),
    ("usd", None),
    ("regularMarketPrice", None),
    ("postMarketPrice", None),
    ("close", None),
    ("last", None),
    ("rate", None),
];

/// Characters of page text searched after each synonym hit
const DEFAULT_TEXT_WINDOW: usize = 400;

/// Locates a price node in a payload for a set of lookup keys
#[derive(Debug, Clone)]
pub struct ShapeExtractor {
    containers: Vec<String>,
    fields: Vec<PriceField>,
    text_window: usize,
}

impl Default for ShapeExtractor {
    fn default() -> Self {
        Self {
            containers: DEFAULT_CONTAINERS.iter().map(|c| c.to_string()).collect(),
            fields: DEFAULT_FIELDS
                .iter()
                .map(|(name, unit)| PriceField::new(name, *unit))
                .collect(),
            text_window: DEFAULT_TEXT_WINDOW,
        }
    }
}

impl ShapeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the container paths (dot-separated, `""` for the root)
    pub fn with_containers(mut self, containers: Vec<String>) -> Self {
        self.containers = containers;
        self
    }

    /// Replace the price fields
    pub fn with_fields(mut self, fields: Vec<PriceField>) -> Self {
        self.fields = fields;
        self
    }

    /// Find `(value, unit hint)` for the first matching key.
    ///
    /// `keys` are the commodity synonyms, optionally followed by the
    /// provider symbol being tried. `fallback_unit` applies to bare fields.
    pub fn locate(&self, payload: &Payload, keys: &[&str], fallback_unit: Option<&str>) -> Option<RawQuote> {
        match payload {
            Payload::Json(root) => {
                json::locate(root, &self.containers, keys, &self.fields, fallback_unit)
            }
            Payload::Table(body) => table::locate(body, keys, &self.fields, fallback_unit),
            Payload::Text(body) => text::locate(body, keys, self.text_window),
        }
    }
}
