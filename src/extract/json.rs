//! JSON shape probing

use super::{PriceField, RawQuote};
use crate::units::parse_decimal;
use serde_json::Value;

/// Keys that identify an element of a quote array
const IDENTITY_FIELDS: &[&str] = &["symbol", "id", "code", "ticker", "name", "key"];

/// Key suffixes that imply a unit, as in `prices.aluminum_per_tonne`
const UNIT_SUFFIXES: &[(&str, &str)] = &[
    ("_per_kg", "/kg"),
    ("_per_tonne", "/t"),
    ("_per_ton", "/t"),
    ("_per_lb", "/lb"),
    ("_per_oz", "/oz"),
];

pub(super) fn locate(
    root: &Value,
    containers: &[String],
    keys: &[&str],
    fields: &[PriceField],
    fallback_unit: Option<&str>,
) -> Option<RawQuote> {
    for container in containers {
        let Some(node) = resolve_path(root, container) else {
            continue;
        };

        for key in keys.iter().flat_map(|k| case_variants(k)) {
            if let Some(quote) = child(node, &key).and_then(|n| quote_from_node(n, fields, fallback_unit)) {
                return Some(quote);
            }

            if let Value::Object(map) = node {
                for (suffix, unit) in UNIT_SUFFIXES {
                    if let Some(value) = map.get(&format!("{key}{suffix}")).and_then(as_number) {
                        return Some(RawQuote::new(value, Some(*unit)));
                    }
                }
            }
        }
    }
    None
}

/// Follow a dot-separated path; numeric segments index arrays
fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    path.split('.').try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Exact key on an object, or the element of an array whose identity field matches
fn child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(key),
        Value::Array(items) => items.iter().find(|item| {
            IDENTITY_FIELDS.iter().any(|field| {
                item.get(field)
                    .and_then(Value::as_str)
                    .is_some_and(|id| id.eq_ignore_ascii_case(key))
            })
        }),
        _ => None,
    }
}

/// The key as given, then lowercase, uppercase and capitalized
fn case_variants(key: &str) -> Vec<String> {
    let mut capitalized = String::with_capacity(key.len());
    let mut chars = key.chars();
    if let Some(first) = chars.next() {
        capitalized.extend(first.to_uppercase());
        capitalized.push_str(&chars.as_str().to_lowercase());
    }

    let mut variants: Vec<String> = Vec::with_capacity(4);
    for variant in [key.to_string(), key.to_lowercase(), key.to_uppercase(), capitalized] {
        if !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    variants
}

/// A number (or numeric string) directly, or the first known price field of an object
fn quote_from_node(node: &Value, fields: &[PriceField], fallback_unit: Option<&str>) -> Option<RawQuote> {
    if let Some(value) = as_number(node) {
        return Some(RawQuote::new(value, fallback_unit));
    }

    let Value::Object(map) = node else {
        return None;
    };

    let node_unit = map
        .get("unit")
        .or_else(|| map.get("units"))
        .and_then(Value::as_str);
    let node_currency = map.get("currency").and_then(Value::as_str);

    fields.iter().find_map(|field| {
        let value = map.get(&field.name).and_then(as_number)?;
        let hint = match &field.unit {
            Some(unit) => Some(unit.clone()),
            None => bare_field_hint(node_currency, node_unit, fallback_unit),
        };
        Some(RawQuote { value, unit_hint: hint })
    })
}

/// Unit for a bare `price`-style field: the node's own unit and currency win
/// over the caller's fallback
fn bare_field_hint(currency: Option<&str>, unit: Option<&str>, fallback: Option<&str>) -> Option<String> {
    match (currency, unit) {
        (Some(currency), Some(unit)) if !unit.contains('/') => Some(format!("{currency}/{unit}")),
        (_, Some(unit)) => Some(unit.to_string()),
        (Some(currency), None) => Some(match fallback {
            Some(fallback) => format!("{currency} {fallback}"),
            None => currency.to_string(),
        }),
        (None, None) => fallback.map(str::to_string),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}
