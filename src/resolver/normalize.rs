//! Raw quote normalization
//!
//! An explicit currency step first when the quote is not already in the
//! canonical currency, then mass conversion (cents, per-lb, per-tonne,
//! magnitude heuristic). The heuristic threshold is in canonical currency, so
//! it only ever sees converted values.

use crate::commodity::Commodity;
use crate::extract::RawQuote;
use crate::fx::FxRates;
use crate::source::SourceError;
use crate::units::{to_canonical_with, Currency, UnitHint};

/// Turns raw quotes into canonical values
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    fx: Option<FxRates>,
}

impl Normalizer {
    pub fn new(fx: Option<FxRates>) -> Self {
        Self { fx }
    }

    pub fn fx(&self) -> Option<&FxRates> {
        self.fx.as_ref()
    }

    /// Normalize a quote to the commodity's canonical unit.
    ///
    /// The quote currency is taken from the unit hint, then `default_currency`
    /// (the source's configured currency), then assumed canonical.
    pub fn normalize(
        &self,
        quote: &RawQuote,
        commodity: &Commodity,
        default_currency: Option<&str>,
    ) -> Result<f64, SourceError> {
        let hint = quote
            .unit_hint
            .as_deref()
            .map(UnitHint::parse)
            .unwrap_or_default();

        if !quote.value.is_finite() {
            return Err(non_finite(quote.value, commodity));
        }

        let target = &commodity.canonical_unit.currency;
        let currency = hint
            .currency
            .clone()
            .or_else(|| default_currency.map(Currency::new))
            .unwrap_or_else(|| target.clone());

        let value = if currency == *target {
            quote.value
        } else {
            self.fx
                .as_ref()
                .and_then(|fx| fx.convert(quote.value, &currency, target))
                .ok_or_else(|| SourceError::Normalization(format!("no FX rate for {currency} -> {target}")))?
        };

        to_canonical_with(value, &hint, &commodity.conversion).ok_or_else(|| non_finite(value, commodity))
    }
}

fn non_finite(value: f64, commodity: &Commodity) -> SourceError {
    SourceError::Normalization(format!("non-finite value {} for {}", value, commodity.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commodity::PlausibleRange;
    use crate::units::{CanonicalUnit, MassUnit, LB_PER_KG};

    fn copper_per_kg() -> Commodity {
        Commodity::new(
            "CU",
            vec!["copper".to_string()],
            CanonicalUnit::usd_per(MassUnit::Kilogram),
            PlausibleRange::new(3.0, 20.0),
        )
    }

    fn fx() -> FxRates {
        FxRates::new(Currency::new("TRY"), "test")
            .with_rate("USD", 32.0)
            .with_rate("EUR", 35.2)
    }

    #[test]
    fn test_usd_per_lb() {
        let value = Normalizer::default()
            .normalize(&RawQuote::new(4.5, Some("USD/lb")), &copper_per_kg(), None)
            .unwrap();
        assert!((value - 4.5 * LB_PER_KG).abs() < 1e-9);
    }

    #[test]
    fn test_cents_per_lb() {
        let value = Normalizer::default()
            .normalize(&RawQuote::new(450.0, Some("USc/lb")), &copper_per_kg(), None)
            .unwrap();
        assert!((value - 4.5 * LB_PER_KG).abs() < 1e-9);
    }

    #[test]
    fn test_unhinted_large_value_assumed_per_tonne() {
        let value = Normalizer::default()
            .normalize(&RawQuote::new(9605.5, None::<String>), &copper_per_kg(), None)
            .unwrap();
        assert!((value - 9.6055).abs() < 1e-9);
    }

    #[test]
    fn test_eur_converted_with_fx() {
        let value = Normalizer::new(Some(fx()))
            .normalize(&RawQuote::new(8800.0, Some("EUR/t")), &copper_per_kg(), None)
            .unwrap();
        assert!((value - 8.8 * 35.2 / 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_source_currency_applies_to_bare_hint() {
        let value = Normalizer::new(Some(fx()))
            .normalize(&RawQuote::new(8.8, Some("/kg")), &copper_per_kg(), Some("eur"))
            .unwrap();
        assert!((value - 8.8 * 35.2 / 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_heuristic_applies_after_currency_conversion() {
        let normalizer = Normalizer::new(Some(fx()));

        // 320 TRY/kg is 10 USD/kg, below the per-tonne threshold
        let value = normalizer
            .normalize(&RawQuote::new(320.0, Some("TRY")), &copper_per_kg(), None)
            .unwrap();
        assert!((value - 10.0).abs() < 1e-9);

        let value = normalizer
            .normalize(&RawQuote::new(307_360.0, None::<String>), &copper_per_kg(), Some("TRY"))
            .unwrap();
        assert!((value - 9.605).abs() < 1e-9);
    }

    #[test]
    fn test_eur_without_fx_fails() {
        let err = Normalizer::default()
            .normalize(&RawQuote::new(8800.0, Some("EUR/t")), &copper_per_kg(), None)
            .unwrap_err();
        assert_eq!(err, SourceError::Normalization("no FX rate for EUR -> USD".to_string()));
    }

    #[test]
    fn test_non_finite_fails() {
        let err = Normalizer::default()
            .normalize(&RawQuote::new(f64::NAN, Some("USD/kg")), &copper_per_kg(), None)
            .unwrap_err();
        assert_eq!(err.kind(), "normalization");
    }
}
