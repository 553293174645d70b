//! Tests for history merging

pub mod merge_tests;

use crate::app::models::{NormalizedRecord, RankingBatch};
use chrono::{DateTime, TimeZone, Utc};

/// Capture time `minutes` after a fixed base
pub fn at_minute(minutes: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 5, 12, minutes, 0).unwrap()
}

/// Record with a rank, city and temperature
pub fn ranked(rank: i64, city: &str, temp_c: f64) -> NormalizedRecord {
    let mut record = NormalizedRecord::new();
    record.insert("rank", rank);
    record.insert("city", city);
    record.insert("temp_c", temp_c);
    record
}

/// Batch of ranks given in presentation order
pub fn batch_of(ranks: &[i64], minutes: u32) -> RankingBatch {
    let records = ranks
        .iter()
        .map(|rank| ranked(*rank, &format!("City {}", rank), 40.0 + *rank as f64))
        .collect();
    RankingBatch::new(records, at_minute(minutes))
}
