//! TCMB daily bulletin (`today.xml`)

use super::FxRates;
use crate::source::{fetch_body, FetchRequest, Fetcher, SourceError};
use crate::units::{parse_decimal, Currency};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

static CURRENCY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<Currency\b([^>]*)>(.*?)</Currency>").expect("Invalid regex")
});

static CODE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:Kod|CurrencyCode)\s*=\s*"([A-Za-z]{3})""#).expect("Invalid regex")
});

static ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(\w+)>\s*([^<]*?)\s*</\w+>").expect("Invalid regex"));

static BULLETIN_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<Tarih_Date\b[^>]*\bDate\s*=\s*"([^"]+)""#).expect("Invalid regex"));

/// Preferred rate fields, first present wins
const RATE_FIELDS: &[&str] = &["ForexSelling", "BanknoteSelling", "ForexBuying", "BanknoteBuying"];

/// Parse a bulletin into a TRY-based table. Returns `None` if no currency
/// block carries a usable rate.
pub fn parse_today_xml(xml: &str) -> Option<FxRates> {
    let mut table = FxRates::new(Currency::new("TRY"), "tcmb");
    table.as_of = BULLETIN_DATE.captures(xml).map(|c| c[1].to_string());

    for block in CURRENCY_BLOCK.captures_iter(xml) {
        let Some(code) = CODE_ATTR.captures(&block[1]).map(|c| c[1].to_ascii_uppercase()) else {
            continue;
        };
        let fields: HashMap<&str, &str> = ELEMENT
            .captures_iter(block.get(2).map_or("", |m| m.as_str()))
            .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
            .collect();

        // Some currencies (JPY) are quoted per 100 units
        let unit = fields
            .get("Unit")
            .and_then(|u| parse_decimal(u))
            .filter(|u| *u > 0.0)
            .unwrap_or(1.0);

        if let Some(rate) = RATE_FIELDS
            .iter()
            .find_map(|name| fields.get(name).and_then(|v| parse_decimal(v)))
        {
            table.insert(&code, rate / unit);
        }
    }

    (!table.is_empty()).then_some(table)
}

/// Download and parse a bulletin
pub async fn fetch_tcmb(fetcher: &dyn Fetcher, url: &str, timeout: Duration) -> Result<FxRates, SourceError> {
    let request = FetchRequest::new(url, timeout).header("Accept", "application/xml, text/xml, */*");
    let body = fetch_body(fetcher, &request, 1, Duration::from_millis(500)).await?;

    let table = parse_today_xml(&body).ok_or_else(|| SourceError::Malformed {
        url: url.to_string(),
        reason: "no currency rates in bulletin".to_string(),
    })?;
    tracing::info!(
        url,
        currencies = table.rates.len(),
        as_of = table.as_of.as_deref().unwrap_or("-"),
        "Loaded FX bulletin"
    );
    Ok(table)
}
