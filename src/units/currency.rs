//! Currency codes and cross-rate conversion

use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO-style currency code, always upper case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// Recognize a currency token as it appears in unit hints and page text
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        let code = match token {
            "$" | "US$" => "USD",
            "€" => "EUR",
            "£" => "GBP",
            "₺" => "TRY",
            other => match other.to_ascii_uppercase().as_str() {
                "USD" | "US$" | "USC" => "USD",
                "EUR" => "EUR",
                "GBP" => "GBP",
                "TRY" | "TL" => "TRY",
                "JPY" => "JPY",
                "CNY" | "RMB" => "CNY",
                "CHF" => "CHF",
                _ => return None,
            },
        };
        Some(Self::new(code))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Convert through a shared base currency.
///
/// Both rates are expressed as units of the base currency per one unit of the
/// quoted currency (e.g. TRY per EUR and TRY per USD). Returns `None` when
/// either rate is missing, non-positive or non-finite.
pub fn cross_convert(value: f64, source_rate: Option<f64>, target_rate: Option<f64>) -> Option<f64> {
    let source_rate = source_rate.filter(|r| r.is_finite() && *r > 0.0)?;
    let target_rate = target_rate.filter(|r| r.is_finite() && *r > 0.0)?;
    let converted = value * (source_rate / target_rate);
    converted.is_finite().then_some(converted)
}
