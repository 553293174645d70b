//! Ranking entry normalization
//!
//! Flattens one raw ranking entry into a flat field-to-scalar record. The
//! transformation never fails: missing fields are simply absent from the
//! output and consumers treat absence as unknown.
//!
//! # Rules (applied in order)
//!
//! 1. Copy every top-level field.
//! 2. Remove `weather` and promote its sub-fields to the top level, except
//!    `condition`, which collapses to `condition_text` = `condition.text`.
//! 3. Remove `flag` and emit `country_code`, the flag URL's file name
//!    without its extension.
//!
//! Any other nested value is rendered as compact JSON text so that no nested
//! values survive.

#[cfg(test)]
pub mod tests;

use crate::app::models::{FieldValue, NormalizedRecord, RawRankingEntry};
use crate::constants::fields;
use serde_json::Value;
use tracing::{debug, trace};

/// Normalize one raw ranking entry
pub fn normalize_entry(entry: &RawRankingEntry) -> NormalizedRecord {
    let mut record: NormalizedRecord = entry
        .iter()
        .filter(|(key, _)| key.as_str() != fields::WEATHER && key.as_str() != fields::FLAG)
        .map(|(key, value)| (key.as_str(), scalar_from_json(value)))
        .collect();

    if let Some(weather) = entry.get(fields::WEATHER) {
        promote_weather(&mut record, weather);
    }

    if let Some(flag) = entry.get(fields::FLAG) {
        match flag.as_str().and_then(country_code_from_flag) {
            Some(code) => record.insert(fields::COUNTRY_CODE, code),
            None => debug!("normalize: flag {} yields no country code", flag),
        }
    }

    trace!("normalize: {} raw field(s) -> {} field(s)", entry.len(), record.len());
    record
}

/// Normalize a whole payload, preserving entry order
pub fn normalize_entries(entries: &[RawRankingEntry]) -> Vec<NormalizedRecord> {
    entries.iter().map(normalize_entry).collect()
}

/// Promote `weather` sub-fields, collapsing `condition` to `condition_text`
fn promote_weather(record: &mut NormalizedRecord, weather: &Value) {
    let Value::Object(weather) = weather else {
        debug!("normalize: 'weather' is not an object, dropping it");
        return;
    };

    for (key, value) in weather {
        if key == fields::CONDITION {
            let text = value
                .get(fields::CONDITION_TEXT_SOURCE)
                .map(scalar_from_json)
                .filter(|text| !text.is_null());
            if let Some(text) = text {
                record.insert(fields::CONDITION_TEXT, text);
            }
        } else {
            record.insert(key.as_str(), scalar_from_json(value));
        }
    }
}

/// Country code encoded as the flag URL's file stem, e.g. `https://x/in.png` -> `in`
pub fn country_code_from_flag(flag_url: &str) -> Option<String> {
    let path = flag_url
        .split(['?', '#'])
        .next()
        .unwrap_or(flag_url)
        .trim_end_matches('/');
    let file_name = path.rsplit('/').next()?;
    let stem = file_name.split('.').next()?;

    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Convert a JSON value into a scalar field value
pub fn scalar_from_json(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(value) => FieldValue::Bool(*value),
        Value::Number(number) => match number.as_i64() {
            Some(int) => FieldValue::Int(int),
            None => number
                .as_f64()
                .map_or_else(|| FieldValue::Text(number.to_string()), FieldValue::Float),
        },
        Value::String(text) => FieldValue::Text(text.clone()),
        Value::Array(_) | Value::Object(_) => FieldValue::Text(value.to_string()),
    }
}
