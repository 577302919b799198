//! Operator overrides
//!
//! An override is read from the environment as `<prefix><ID>`, e.g.
//! `PRICE_OVERRIDE_CU="9605.5 USD/t"`. The amount may be followed by a unit
//! hint; without one the commodity's canonical unit is assumed.

use crate::extract::RawQuote;
use crate::units::parse_decimal;
use std::collections::HashMap;

/// Default environment key prefix
pub const DEFAULT_OVERRIDE_PREFIX: &str = "PRICE_OVERRIDE_";

#[derive(Debug, Clone, Default)]
pub struct Overrides {
    quotes: HashMap<String, RawQuote>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `<prefix><ID>` for every id from the process environment
    pub fn from_env<'a>(prefix: &str, ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self::from_lookup(prefix, ids, |key| std::env::var(key).ok())
    }

    /// Same as [`Overrides::from_env`] with an arbitrary key-value source
    pub fn from_lookup<'a>(
        prefix: &str,
        ids: impl IntoIterator<Item = &'a str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut overrides = Self::new();
        for id in ids {
            let key = format!("{}{}", prefix, id.to_ascii_uppercase());
            let Some(raw) = lookup(&key).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            match parse_override(&raw) {
                Some(quote) => {
                    tracing::info!(commodity = id, key = %key, value = quote.value, "Override configured");
                    overrides.quotes.insert(id.to_string(), quote);
                }
                None => tracing::warn!(commodity = id, key = %key, raw = %raw, "Ignoring unparseable override"),
            }
        }
        overrides
    }

    pub fn insert(&mut self, id: impl Into<String>, quote: RawQuote) {
        self.quotes.insert(id.into(), quote);
    }

    pub fn get(&self, id: &str) -> Option<&RawQuote> {
        self.quotes.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// `"<amount> [unit hint]"`
fn parse_override(raw: &str) -> Option<RawQuote> {
    let raw = raw.trim();
    let (amount, hint) = match raw.split_once(char::is_whitespace) {
        Some((amount, hint)) => (amount, Some(hint.trim()).filter(|h| !h.is_empty())),
        None => (raw, None),
    };
    let value = parse_decimal(amount)?;
    Some(RawQuote::new(value, hint))
}
