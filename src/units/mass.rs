//! Mass units used as the denominator of a price basis

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pounds per kilogram
pub const LB_PER_KG: f64 = 2.20462262185;

/// Pounds per metric tonne
pub const LB_PER_TONNE: f64 = 2204.62262185;

/// Grams per troy ounce
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1034768;

/// Mass unit a price is quoted against (USD per *this*)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassUnit {
    Kilogram,
    Tonne,
    Pound,
    TroyOunce,
    Gram,
}

impl MassUnit {
    /// How many of this unit make up one kilogram
    pub fn per_kilogram(self) -> f64 {
        match self {
            MassUnit::Kilogram => 1.0,
            MassUnit::Tonne => 0.001,
            MassUnit::Pound => LB_PER_KG,
            MassUnit::TroyOunce => 1000.0 / GRAMS_PER_TROY_OUNCE,
            MassUnit::Gram => 1000.0,
        }
    }

    /// Re-express a price quoted per `self` as a price per `target`.
    ///
    /// A price per pound becomes a larger price per kilogram, so the factor is
    /// `per_kilogram(self) / per_kilogram(target)`.
    pub fn convert_price(self, value: f64, target: MassUnit) -> f64 {
        if self == target {
            return value;
        }
        match (self, target) {
            // Keep the published constants exact for the common cases
            (MassUnit::Pound, MassUnit::Tonne) => value * LB_PER_TONNE,
            (MassUnit::Tonne, MassUnit::Pound) => value / LB_PER_TONNE,
            (MassUnit::Tonne, MassUnit::Kilogram) => value / 1000.0,
            (MassUnit::Kilogram, MassUnit::Tonne) => value * 1000.0,
            _ => value * (self.per_kilogram() / target.per_kilogram()),
        }
    }

    /// Recognize a unit word such as `kg`, `tonne`, `lbs` or `oz`
    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_ascii_lowercase().as_str() {
            "kg" | "kgs" | "kilo" | "kilos" | "kilogram" | "kilograms" => Some(MassUnit::Kilogram),
            "t" | "mt" | "ton" | "tons" | "tonne" | "tonnes" | "metric" => Some(MassUnit::Tonne),
            "lb" | "lbs" | "pound" | "pounds" => Some(MassUnit::Pound),
            "oz" | "ozt" | "toz" | "troy" | "ounce" | "ounces" => Some(MassUnit::TroyOunce),
            "g" | "gr" | "gram" | "grams" => Some(MassUnit::Gram),
            _ => None,
        }
    }

    /// Short symbol used when printing units
    pub fn symbol(self) -> &'static str {
        match self {
            MassUnit::Kilogram => "kg",
            MassUnit::Tonne => "t",
            MassUnit::Pound => "lb",
            MassUnit::TroyOunce => "oz",
            MassUnit::Gram => "g",
        }
    }
}

impl fmt::Display for MassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
