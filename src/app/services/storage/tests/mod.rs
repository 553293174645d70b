//! Tests for artifact persistence

pub mod csv_history_tests;

use crate::app::models::{
    HistoricalDataset, LeaderSnapshot, NormalizedRecord, RankingBatch,
};
use crate::app::services::dataset_merger::merge_batches;
use chrono::{DateTime, TimeZone, Utc};

/// Capture time on a fixed day
pub fn captured_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 5, hour, minute, 0).unwrap()
}

/// Record shaped like a normalized ranking entry
pub fn ranking_record(rank: i64, city: &str, temp_c: f64) -> NormalizedRecord {
    let mut record = NormalizedRecord::new();
    record.insert("rank", rank);
    record.insert("city", city);
    record.insert("country", "India");
    record.insert("country_code", "in");
    record.insert("temp_c", temp_c);
    record.insert("condition_text", "Sunny");
    record
}

/// Two-record batch
pub fn sample_batch(hour: u32, minute: u32) -> RankingBatch {
    RankingBatch::new(
        vec![
            ranking_record(1, "Delhi", 45.5),
            ranking_record(2, "Jaipur", 44.2),
        ],
        captured_at(hour, minute),
    )
}

/// History built from the given batches
pub fn history_of(batches: &[RankingBatch]) -> HistoricalDataset {
    merge_batches(HistoricalDataset::empty(), batches).dataset
}

pub fn sample_snapshot() -> LeaderSnapshot {
    LeaderSnapshot {
        city: "Delhi".to_string(),
        country: "India".to_string(),
        country_code: "in".to_string(),
        temperature: "45.5 °C".to_string(),
        condition: "Sunny".to_string(),
        last_updated: "05 Jun 2024, 02:30 PM".to_string(),
    }
}
