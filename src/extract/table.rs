//! CSV row extraction

use super::{PriceField, RawQuote};
use crate::units::parse_decimal;

/// Header names that identify the instrument on a row
const IDENTITY_COLUMNS: &[&str] = &["symbol", "ticker", "code", "key", "id", "name", "metal"];

pub(super) fn locate(body: &str, keys: &[&str], fields: &[PriceField], fallback_unit: Option<&str>) -> Option<RawQuote> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .ok()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_lowercase())
        .collect();

    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
    let identity = IDENTITY_COLUMNS.iter().find_map(|name| column(*name));
    let unit_column = column("unit");
    let value_columns: Vec<(usize, &PriceField)> = fields
        .iter()
        .filter_map(|field| column(&field.name).map(|idx| (idx, field)))
        .collect();

    for record in reader.records().filter_map(Result::ok) {
        if let Some(idx) = identity {
            let Some(cell) = record.get(idx) else {
                continue;
            };
            if !keys.iter().any(|key| key.eq_ignore_ascii_case(cell)) {
                continue;
            }
        }

        let row_unit = unit_column
            .and_then(|idx| record.get(idx))
            .filter(|u| !u.is_empty());

        let quote = value_columns.iter().find_map(|(idx, field)| {
            let value = record.get(*idx).and_then(parse_decimal)?;
            let hint = field
                .unit
                .as_deref()
                .or(row_unit)
                .or(fallback_unit)
                .map(str::to_string);
            Some(RawQuote { value, unit_hint: hint })
        });

        if quote.is_some() {
            return quote;
        }
    }
    None
}
