//! Leader snapshot projection
//!
//! Derives the small "current hottest place" record that the static front
//! page polls. The snapshot is replaced wholesale every cycle.

use crate::app::models::{FieldValue, LeaderSnapshot, NormalizedRecord};
use crate::constants::{SNAPSHOT_TIME_FORMAT, TEMPERATURE_UNAVAILABLE, fields};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Project the leader of a batch, stamped with the current time
///
/// Returns `None` for an empty batch; callers skip the cycle in that case.
pub fn project_leader(records: &[NormalizedRecord]) -> Option<LeaderSnapshot> {
    project_leader_at(records, Utc::now())
}

/// Project the leader of a batch, stamped with `captured_at`
///
/// The leader is the entry with `rank == 1`. When no such entry exists the
/// first entry as presented is used and the fallback is logged.
pub fn project_leader_at(
    records: &[NormalizedRecord],
    captured_at: DateTime<Utc>,
) -> Option<LeaderSnapshot> {
    let leader = match records.iter().find(|record| record.rank() == Some(1)) {
        Some(leader) => leader,
        None => {
            let first = records.first()?;
            warn!(
                "project: no entry with rank 1 among {} record(s), falling back to first entry (rank {:?}, city {:?})",
                records.len(),
                first.rank(),
                first.text(fields::CITY)
            );
            first
        }
    };

    Some(LeaderSnapshot {
        city: text_field(leader, fields::CITY),
        country: text_field(leader, fields::COUNTRY),
        country_code: text_field(leader, fields::COUNTRY_CODE),
        temperature: format_temperature(leader.get(fields::TEMP_C)),
        condition: text_field(leader, fields::CONDITION_TEXT),
        last_updated: format_timestamp(captured_at),
    })
}

/// `"<value> °C"` for numeric temperatures, `"N/A"` otherwise
pub fn format_temperature(value: Option<&FieldValue>) -> String {
    match value.and_then(FieldValue::as_f64) {
        Some(celsius) => format!("{} °C", celsius),
        None => TEMPERATURE_UNAVAILABLE.to_string(),
    }
}

/// Human readable UTC timestamp, e.g. `05 Jun 2024, 02:30 PM`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(SNAPSHOT_TIME_FORMAT).to_string()
}

fn text_field(record: &NormalizedRecord, key: &str) -> String {
    record
        .get(key)
        .filter(|value| !value.is_null())
        .map(ToString::to_string)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(rank: i64, city: &str, temp: Option<f64>) -> NormalizedRecord {
        let mut record = NormalizedRecord::new();
        record.insert("rank", rank);
        record.insert("city", city);
        record.insert("country", "Testland");
        record.insert("country_code", "tl");
        record.insert("condition_text", "Sunny");
        if let Some(temp) = temp {
            record.insert("temp_c", temp);
        }
        record
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 5, 14, 30, 59).unwrap()
    }

    #[test]
    fn test_projects_rank_one_even_when_not_first() {
        let records = vec![
            record(2, "Second", Some(40.0)),
            record(1, "Leader", Some(41.2)),
        ];

        let snapshot = project_leader_at(&records, fixed_time()).unwrap();
        assert_eq!(snapshot.city, "Leader");
        assert_eq!(snapshot.country, "Testland");
        assert_eq!(snapshot.country_code, "tl");
        assert_eq!(snapshot.temperature, "41.2 °C");
        assert_eq!(snapshot.condition, "Sunny");
        assert_eq!(snapshot.last_updated, "05 Jun 2024, 02:30 PM");
    }

    #[test]
    fn test_falls_back_to_first_entry_without_rank_one() {
        let records = vec![record(3, "Third", Some(39.0)), record(2, "Second", Some(40.0))];

        let snapshot = project_leader_at(&records, fixed_time()).unwrap();
        assert_eq!(snapshot.city, "Third");
    }

    #[test]
    fn test_missing_temperature_is_not_available() {
        let records = vec![record(1, "Cold Data", None)];
        let snapshot = project_leader_at(&records, fixed_time()).unwrap();
        assert_eq!(snapshot.temperature, "N/A");

        assert_eq!(format_temperature(Some(&FieldValue::from("hot"))), "N/A");
        assert_eq!(format_temperature(Some(&FieldValue::Int(45))), "45 °C");
    }

    #[test]
    fn test_missing_text_fields_default_to_empty() {
        let mut sparse = NormalizedRecord::new();
        sparse.insert("rank", 1i64);
        sparse.insert("city", "Only City");

        let snapshot = project_leader_at(&[sparse], fixed_time()).unwrap();
        assert_eq!(snapshot.city, "Only City");
        assert_eq!(snapshot.country, "");
        assert_eq!(snapshot.country_code, "");
        assert_eq!(snapshot.condition, "");
    }

    #[test]
    fn test_empty_batch_has_no_leader() {
        assert!(project_leader(&[]).is_none());
    }

    #[test]
    fn test_timestamp_uses_twelve_hour_clock() {
        let morning = Utc.with_ymd_and_hms(2025, 1, 9, 0, 5, 0).unwrap();
        assert_eq!(format_timestamp(morning), "09 Jan 2025, 12:05 AM");
    }

    #[test]
    fn test_snapshot_serializes_with_fixed_keys() {
        let snapshot = project_leader_at(&[record(1, "Delhi", Some(41.2))], fixed_time()).unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();

        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["city", "condition", "country", "countryCode", "lastUpdated", "temperature"]
        );
    }
}
