//! Tests for the CSV history store

use super::*;
use crate::app::services::dataset_merger::merge_batch;
use crate::app::services::storage::{CsvHistoryStore, HistoryStore};
use tempfile::TempDir;

#[test]
fn test_missing_file_loads_as_empty_history() {
    let temp_dir = TempDir::new().unwrap();
    let store = CsvHistoryStore::new(temp_dir.path().join("consolidated_rankings.csv"));

    assert!(store.load().unwrap().is_empty());
}

#[test]
fn test_save_then_load_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = CsvHistoryStore::new(temp_dir.path().join("consolidated_rankings.csv"));
    let history = history_of(&[sample_batch(12, 0), sample_batch(13, 0)]);

    store.save(&history).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, history);
}

#[test]
fn test_saved_file_layout() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("consolidated_rankings.csv");
    let store = CsvHistoryStore::new(&path);

    store.save(&history_of(&[sample_batch(12, 0)])).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let mut lines = content.lines();
    assert_eq!(
        lines.next(),
        Some("scraped_datetime,rank,city,condition_text,country,country_code,temp_c")
    );
    assert!(lines.next().unwrap().starts_with("2024-06-05 12:00:00,1,Delhi,"));
    // No temp file left behind
    assert!(!temp_dir.path().join("consolidated_rankings.csv.tmp").exists());
}

#[test]
fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("dir").join("history.csv");
    let store = CsvHistoryStore::new(&path);

    store.save(&history_of(&[sample_batch(12, 0)])).unwrap();
    assert!(path.exists());
}

#[test]
fn test_corrupt_file_is_a_cold_start() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("consolidated_rankings.csv");
    std::fs::write(&path, "city,country\nDelhi,India\n").unwrap();
    let store = CsvHistoryStore::new(&path);

    assert!(store.load().is_err());
    assert!(store.load_or_empty().is_empty());
}

#[test]
fn test_load_repairs_unsorted_duplicates() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("consolidated_rankings.csv");
    std::fs::write(
        &path,
        "scraped_datetime,rank,city\n\
         2024-06-05 13:00:00,1,Later\n\
         2024-06-05 12:00:00,2,Second\n\
         2024-06-05 12:00:00,1,First\n\
         2024-06-05 12:00:00,1,Copy\n",
    )
    .unwrap();

    let loaded = CsvHistoryStore::new(&path).load().unwrap();
    let cities: Vec<&str> = loaded
        .rows()
        .iter()
        .map(|row| row.record.text("city").unwrap())
        .collect();
    assert_eq!(cities, vec!["First", "Second", "Later"]);
}

#[test]
fn test_new_columns_appear_on_later_cycles() {
    let temp_dir = TempDir::new().unwrap();
    let store = CsvHistoryStore::new(temp_dir.path().join("history.csv"));

    let first = history_of(&[sample_batch(12, 0)]);
    store.save(&first).unwrap();

    let mut later = sample_batch(12, 30);
    later.records[0].insert("uv_index", 11i64);
    let merged = merge_batch(store.load().unwrap(), &later).dataset;
    store.save(&merged).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 4);
    assert!(loaded.columns().contains(&"uv_index".to_string()));
    assert!(!loaded.rows()[0].record.contains_key("uv_index"));
    assert_eq!(loaded.rows()[2].record.get("uv_index").and_then(|v| v.as_i64()), Some(11));
}

#[test]
fn test_batch_with_scraped_datetime_field_saves() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("consolidated_rankings.csv");
    let store = CsvHistoryStore::new(&path);

    let mut batch = sample_batch(12, 0);
    batch.records[0].insert("scraped_datetime", "x");
    store.save(&history_of(&[batch])).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let header = content.lines().next().unwrap();
    assert_eq!(header.matches("scraped_datetime").count(), 1);
    assert_eq!(store.load().unwrap().rows()[0].scraped_datetime, captured_at(12, 0));
}

#[test]
fn test_stored_text_survives_reload_and_rewrite() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("consolidated_rankings.csv");
    let store = CsvHistoryStore::new(&path);

    let mut batch = sample_batch(12, 0);
    batch.records[0].insert("code", "007");
    batch.records[1].insert("code", "007");
    batch.records[0].insert("feels_like", 46.0);
    batch.records[1].insert("feels_like", 44.0);
    let history = history_of(&[batch]);

    store.save(&history).unwrap();
    let first_write = std::fs::read_to_string(&path).unwrap();
    let loaded = store.load().unwrap();

    assert_eq!(loaded, history);
    assert_eq!(loaded.rows()[0].record.text("code"), Some("007"));
    assert_eq!(loaded.rows()[0].rank(), Some(1));

    store.save(&loaded).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), first_write);
}
