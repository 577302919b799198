//! Unit hints and conversion into a canonical price basis

use super::{Currency, MassUnit};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Magnitude threshold for per-kg commodities quoted without a unit
pub const DEFAULT_PER_KG_THRESHOLD: f64 = 200.0;

/// What a free-form unit hint such as `"USD/lb"`, `"price_per_tonne"` or
/// `"USc/lb"` says about a number
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitHint {
    pub currency: Option<Currency>,
    pub mass: Option<MassUnit>,
    /// Quoted in hundredths of the currency (cents per pound)
    pub cents: bool,
}

impl UnitHint {
    /// Parse a hint by keyword matching, case-insensitively. Unknown pieces
    /// are ignored rather than rejected.
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        let normalized = lowered
            .replace("_per_", "/")
            .replace(" per ", "/")
            .replace("-per-", "/");

        let mut hint = UnitHint::default();

        // The mass unit is whatever word follows the last slash
        if let Some((_, after)) = normalized.rsplit_once('/') {
            let word: String = after
                .trim_start()
                .chars()
                .take_while(|c| c.is_alphabetic())
                .collect();
            hint.mass = MassUnit::from_word(&word);
        }

        for token in tokens(&normalized) {
            if hint.currency.is_none() {
                hint.currency = Currency::from_token(token);
            }
            if hint.mass.is_none() && !normalized.contains('/') {
                hint.mass = MassUnit::from_word(token);
            }
            if matches!(token, "c" | "¢" | "usc" | "cent" | "cents") {
                hint.cents = true;
            }
        }

        if hint.cents && hint.currency.is_none() {
            hint.currency = Some(Currency::usd());
        }
        hint
    }
}

/// Split on anything that is not part of a word or currency symbol
fn tokens(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !(c.is_alphanumeric() || matches!(c, '$' | '€' | '£' | '₺' | '¢')))
        .flat_map(split_symbol)
        .filter(|t| !t.is_empty())
}

/// `"us$"` stays whole, but `"$4"` or `"€"` glued to letters are split off
fn split_symbol(token: &str) -> Vec<&str> {
    if token == "us$" {
        return vec![token];
    }
    let mut parts = Vec::new();
    let mut start = 0;
    for (idx, ch) in token.char_indices() {
        if matches!(ch, '$' | '€' | '£' | '₺' | '¢') {
            parts.push(&token[start..idx]);
            parts.push(&token[idx..idx + ch.len_utf8()]);
            start = idx + ch.len_utf8();
        }
    }
    parts.push(&token[start..]);
    parts
}

/// Assumptions applied when a number arrives without a recognizable mass unit.
///
/// This is a best-effort guess, not a conversion contract: many feeds omit
/// units, and a large raw number is more likely a per-tonne quote than a
/// per-kg one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionContext {
    /// Mass basis of the canonical unit
    pub canonical: MassUnit,
    /// Unit assumed for unhinted values at or below the threshold
    pub assumed_unit_if_unknown: MassUnit,
    /// Unhinted values above this are assumed to be quoted per `large_value_unit`
    pub large_value_threshold: Option<f64>,
    pub large_value_unit: MassUnit,
}

impl ConversionContext {
    /// Defaults for a canonical basis: per-kg commodities get the magnitude
    /// heuristic, everything else assumes the canonical unit.
    pub fn for_canonical(canonical: MassUnit) -> Self {
        let large_value_threshold = match canonical {
            MassUnit::Kilogram => Some(DEFAULT_PER_KG_THRESHOLD),
            _ => None,
        };
        Self {
            canonical,
            assumed_unit_if_unknown: canonical,
            large_value_threshold,
            large_value_unit: MassUnit::Tonne,
        }
    }

    fn infer_unit(&self, value: f64) -> MassUnit {
        match self.large_value_threshold {
            Some(threshold) if value > threshold => self.large_value_unit,
            _ => self.assumed_unit_if_unknown,
        }
    }
}

/// Normalize a raw value to the canonical mass basis.
///
/// Currency is left untouched; see [`super::cross_convert`]. Returns `None`
/// only when the input is not a finite number.
pub fn to_canonical(value: f64, unit_hint: Option<&str>, context: &ConversionContext) -> Option<f64> {
    let hint = unit_hint.map(UnitHint::parse).unwrap_or_default();
    to_canonical_with(value, &hint, context)
}

/// Same as [`to_canonical`] for an already parsed hint
pub fn to_canonical_with(value: f64, hint: &UnitHint, context: &ConversionContext) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let value = if hint.cents { value / 100.0 } else { value };
    let from = hint.mass.unwrap_or_else(|| context.infer_unit(value));
    let converted = from.convert_price(value, context.canonical);
    converted.is_finite().then_some(converted)
}

/// A currency per mass unit, e.g. `USD/kg`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalUnit {
    pub currency: Currency,
    pub mass: MassUnit,
}

impl CanonicalUnit {
    pub fn new(currency: Currency, mass: MassUnit) -> Self {
        Self { currency, mass }
    }

    pub fn usd_per(mass: MassUnit) -> Self {
        Self::new(Currency::usd(), mass)
    }
}

impl fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.currency, self.mass)
    }
}

impl FromStr for CanonicalUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hint = UnitHint::parse(s);
        match (hint.currency, hint.mass, hint.cents) {
            (Some(currency), Some(mass), false) => Ok(Self { currency, mass }),
            _ => Err(format!("Unrecognized canonical unit: {s:?}")),
        }
    }
}

impl TryFrom<String> for CanonicalUnit {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CanonicalUnit> for String {
    fn from(unit: CanonicalUnit) -> Self {
        unit.to_string()
    }
}
