//! Locale-tolerant number parsing
//!
//! Upstream feeds mix `1,234.56`, `1.234,56` and `1234,56`. When both
//! separators appear, the rightmost one is the decimal point. A lone comma is a
//! thousands separator only when it is the single separator and is followed by
//! exactly three digits after a one-to-three digit integer part (`1,234`);
//! otherwise it is a decimal comma. A lone dot is a decimal point unless it
//! repeats (`1.234.567`).

/// Parse a human-formatted decimal number, returning `None` unless the result is finite
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('+')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '\'' && *c != '_')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let normalized = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (decimal, thousands) = if dot > comma { ('.', ",") } else { (',', ".") };
            cleaned.replace(thousands, "").replace(decimal, ".")
        }
        (None, Some(comma)) => normalize_lone_comma(&cleaned, comma),
        (Some(_), None) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    let value: f64 = normalized.parse().ok()?;
    value.is_finite().then_some(value)
}

fn normalize_lone_comma(s: &str, comma: usize) -> String {
    if s.matches(',').count() > 1 {
        return s.replace(',', "");
    }

    let integer = s[..comma].trim_start_matches('-');
    let fraction = &s[comma + 1..];
    let grouped = fraction.len() == 3
        && (1..=3).contains(&integer.len())
        && integer != "0"
        && fraction.chars().all(|c| c.is_ascii_digit());

    if grouped {
        s.replace(',', "")
    } else {
        s.replace(',', ".")
    }
}
