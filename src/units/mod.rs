//! Unit conversion
//!
//! Normalizes raw quotes into a canonical currency-per-mass basis:
//! mass conversion driven by unit hints (with a magnitude heuristic when a
//! feed omits units), currency cross conversion, and decimal parsing that
//! tolerates both `.` and `,` separators.

mod convert;
mod currency;
mod mass;
mod number;

pub use convert::{
    to_canonical, to_canonical_with, CanonicalUnit, ConversionContext, UnitHint,
    DEFAULT_PER_KG_THRESHOLD,
};
pub use currency::{cross_convert, Currency};
pub use mass::{MassUnit, GRAMS_PER_TROY_OUNCE, LB_PER_KG, LB_PER_TONNE};
pub use number::parse_decimal;
