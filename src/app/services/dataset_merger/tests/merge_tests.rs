//! Tests for merge ordering, deduplication and accounting

use super::*;
use crate::app::models::{HistoricalDataset, HistoryRow, NormalizedRecord, RankingBatch};
use crate::app::services::dataset_merger::{
    is_sorted_and_unique, merge_batch, merge_batches, sort_and_deduplicate, tag_batch,
};

#[test]
fn test_empty_history_plus_three_records() {
    let outcome = merge_batch(HistoricalDataset::empty(), &batch_of(&[3, 1, 2], 0));

    assert_eq!(outcome.dataset.len(), 3);
    assert_eq!(outcome.rows_added, 3);
    assert_eq!(outcome.duplicates_dropped, 0);

    let ranks: Vec<Option<i64>> = outcome.dataset.rows().iter().map(HistoryRow::rank).collect();
    assert_eq!(ranks, vec![Some(1), Some(2), Some(3)]);
    assert!(is_sorted_and_unique(outcome.dataset.rows()));
}

#[test]
fn test_batch_rows_share_one_timestamp() {
    let batch = batch_of(&[1, 2, 3, 4], 7);
    let rows = tag_batch(&batch);

    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|row| row.scraped_datetime == at_minute(7)));
    // Presentation order is kept in the returned batch
    assert_eq!(rows[3].rank(), Some(4));
}

#[test]
fn test_merging_same_batch_twice_is_idempotent() {
    let batch = batch_of(&[1, 2, 3], 5);

    let once = merge_batch(HistoricalDataset::empty(), &batch);
    let twice = merge_batch(once.dataset.clone(), &batch);

    assert_eq!(twice.dataset.len(), once.dataset.len());
    assert_eq!(twice.rows_added, 0);
    assert_eq!(twice.duplicates_dropped, 3);
    assert_eq!(twice.dataset, once.dataset);
}

#[test]
fn test_existing_rows_win_over_reingested_copy() {
    let original = batch_of(&[1, 2], 5);
    let history = merge_batch(HistoricalDataset::empty(), &original).dataset;

    let mut replay = original.clone();
    replay.records[0].insert("city", "Replayed");
    let outcome = merge_batch(history, &replay);

    assert_eq!(outcome.dataset.len(), 2);
    assert_eq!(outcome.dataset.rows()[0].record.text("city"), Some("City 1"));
}

#[test]
fn test_later_batch_appends_in_order() {
    let first = merge_batch(HistoricalDataset::empty(), &batch_of(&[1, 2, 3], 10));
    let second = merge_batch(first.dataset, &batch_of(&[2, 1, 3], 20));

    assert_eq!(second.dataset.len(), 6);
    assert_eq!(second.rows_added, 3);
    assert!(is_sorted_and_unique(second.dataset.rows()));
    assert_eq!(second.dataset.cycle_count(), 2);
    assert_eq!(
        second.dataset.time_span(),
        Some((at_minute(10), at_minute(20)))
    );
}

#[test]
fn test_out_of_order_batches_are_sorted_by_time() {
    let outcome = merge_batches(
        HistoricalDataset::empty(),
        &[batch_of(&[1, 2], 30), batch_of(&[2, 1], 10), batch_of(&[1], 20)],
    );

    let keys: Vec<(u32, Option<i64>)> = outcome
        .dataset
        .rows()
        .iter()
        .map(|row| (chrono::Timelike::minute(&row.scraped_datetime), row.rank()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (10, Some(1)),
            (10, Some(2)),
            (20, Some(1)),
            (30, Some(1)),
            (30, Some(2)),
        ]
    );
}

#[test]
fn test_duplicate_ranks_within_one_batch_keep_first() {
    let mut records = vec![ranked(1, "First One", 41.0), ranked(1, "Second One", 42.0)];
    records.push(ranked(2, "Two", 40.0));
    let batch = RankingBatch::new(records, at_minute(0));

    let outcome = merge_batch(HistoricalDataset::empty(), &batch);

    assert_eq!(outcome.dataset.len(), 2);
    assert_eq!(outcome.duplicates_dropped, 1);
    assert_eq!(outcome.dataset.rows()[0].record.text("city"), Some("First One"));
}

#[test]
fn test_unranked_rows_sort_last_within_timestamp() {
    let mut unranked = NormalizedRecord::new();
    unranked.insert("city", "Mystery");
    let batch = RankingBatch::new(vec![unranked, ranked(2, "Two", 40.0)], at_minute(0));

    let outcome = merge_batch(HistoricalDataset::empty(), &batch);
    let rows = outcome.dataset.rows();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].rank(), Some(2));
    assert_eq!(rows[1].rank(), None);
}

#[test]
fn test_sort_and_deduplicate_repairs_arbitrary_rows() {
    let rows = vec![
        HistoryRow::new(at_minute(2), ranked(1, "b", 1.0)),
        HistoryRow::new(at_minute(1), ranked(2, "a", 1.0)),
        HistoryRow::new(at_minute(2), ranked(1, "dup", 1.0)),
        HistoryRow::new(at_minute(1), ranked(1, "a", 1.0)),
    ];

    let (dataset, dropped) = sort_and_deduplicate(rows);
    assert_eq!(dropped, 1);
    assert!(is_sorted_and_unique(dataset.rows()));
    assert_eq!(dataset.rows()[2].record.text("city"), Some("b"));
}

#[test]
fn test_schema_drift_adds_columns_without_losing_old_ones() {
    let first = merge_batch(HistoricalDataset::empty(), &batch_of(&[1], 0));

    let mut drifted = ranked(1, "Drift", 45.0);
    drifted.insert("humidity", 10i64);
    let second = merge_batch(
        first.dataset,
        &RankingBatch::new(vec![drifted], at_minute(1)),
    );

    assert_eq!(
        second.dataset.columns(),
        vec!["scraped_datetime", "rank", "city", "humidity", "temp_c"]
    );
}

#[test]
fn test_record_scraped_datetime_field_is_replaced_by_batch_time() {
    let mut record = ranked(1, "Delhi", 45.5);
    record.insert("scraped_datetime", "x");
    let batch = RankingBatch::new(vec![record], at_minute(3));

    let outcome = merge_batch(HistoricalDataset::empty(), &batch);

    let row = &outcome.dataset.rows()[0];
    assert_eq!(row.scraped_datetime, at_minute(3));
    assert!(!row.record.contains_key("scraped_datetime"));
    assert_eq!(
        outcome.dataset.columns(),
        vec!["scraped_datetime", "rank", "city", "temp_c"]
    );
}
