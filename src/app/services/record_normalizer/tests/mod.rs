//! Tests for ranking entry normalization

pub mod normalizer_tests;

use crate::app::models::RawRankingEntry;

/// Parse a JSON object literal into a raw ranking entry
pub fn raw_entry(json: &str) -> RawRankingEntry {
    match serde_json::from_str(json) {
        Ok(serde_json::Value::Object(entry)) => entry,
        other => panic!("fixture is not a JSON object: {:?}", other),
    }
}
