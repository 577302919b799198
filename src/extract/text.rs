//! Regular-expression extraction from HTML and plain text

use super::RawQuote;
use crate::units::{parse_decimal, Currency};
use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

const AMOUNT: &str = r"(?P<amount>\d[\d.,]*\d|\d)";
const CURRENCY: &str = r"(?P<currency>\bUS\$|\bUSD\b|\bEUR\b|\bGBP\b|\bTRY\b|\bTL\b|\$|€|£|₺)";
const PER: &str = r"\s*(?:/|per)\s*";
const UNIT: &str = r"(?P<unit>kilograms?|kg|lbs?|pounds?|tonnes?|tons?|mt|t|ozt|oz|grams?|g)\b";

/// Script/style blocks and tags, replaced by a space
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<[^>]*>").expect("Invalid regex")
});

/// Ends of table rows and list items
static ROW_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</\s*(?:tr|li)\s*>").expect("Invalid regex"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s|&nbsp;)+").expect("Invalid regex"));

/// Marks a row end in visible text; a search window never crosses it
const ROW_BREAK: char = '\u{1e}';

/// Earlier patterns win over later ones they overlap
static PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // 9,605.50 USD/t
        format!(r"(?i){AMOUNT}\s*{CURRENCY}{PER}{UNIT}"),
        // USD/t: 9605.50
        format!(r"(?i){CURRENCY}{PER}{UNIT}\s*[:=]?\s*{AMOUNT}"),
        // $4.49/lb
        format!(r"(?i){CURRENCY}\s*{AMOUNT}{PER}{UNIT}"),
        // USD 9,605.50
        format!(r"(?i){CURRENCY}\s*{AMOUNT}"),
        // 9.605,50 EUR
        format!(r"(?i){AMOUNT}\s*{CURRENCY}"),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid regex"))
    .collect()
});

/// Find the price closest after a synonym hit, within `window` bytes and
/// the same table row. Absent when no key occurs in the text.
pub(super) fn locate(body: &str, keys: &[&str], window: usize) -> Option<RawQuote> {
    let text = visible_text(body);

    for key in keys.iter().filter(|k| !k.trim().is_empty()) {
        let Ok(key_regex) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(key))) else {
            continue;
        };
        for hit in key_regex.find_iter(&text) {
            let limit = floor_char_boundary(&text, (hit.start() + window).min(text.len())).max(hit.end());
            let end = text[hit.end()..limit]
                .find(ROW_BREAK)
                .map_or(limit, |offset| hit.end() + offset);
            if let Some(quote) = nearest_match(&text[hit.start()..end]) {
                return Some(quote);
            }
        }
    }
    None
}

/// Markup stripped and whitespace collapsed, row ends kept as [`ROW_BREAK`]
fn visible_text(body: &str) -> String {
    let rows = ROW_END.replace_all(body, ROW_BREAK.to_string().as_str());
    let stripped = MARKUP.replace_all(&rows, " ");
    WHITESPACE.replace_all(&stripped, " ").into_owned()
}

/// The match starting earliest in `text`, ignoring matches that overlap one
/// from an earlier pattern
fn nearest_match(text: &str) -> Option<RawQuote> {
    let mut found: Vec<(Range<usize>, RawQuote)> = Vec::new();

    for pattern in PATTERNS.iter() {
        let matches: Vec<(Range<usize>, RawQuote)> = pattern
            .captures_iter(text)
            .filter_map(|caps| Some((caps.get(0)?.range(), quote_from(&caps)?)))
            .filter(|(range, _)| {
                found
                    .iter()
                    .all(|(kept, _)| range.end <= kept.start || range.start >= kept.end)
            })
            .collect();
        found.extend(matches);
    }

    found
        .into_iter()
        .min_by_key(|(range, _)| range.start)
        .map(|(_, quote)| quote)
}

fn quote_from(caps: &Captures) -> Option<RawQuote> {
    let value = parse_decimal(caps.name("amount")?.as_str())?;
    let currency = Currency::from_token(caps.name("currency")?.as_str())?;
    let hint = match caps.name("unit") {
        Some(unit) => format!("{currency}/{}", unit.as_str()),
        None => currency.to_string(),
    };
    Some(RawQuote {
        value,
        unit_hint: Some(hint),
    })
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
