//! History merging
//!
//! Appends ranking batches to the historical dataset while keeping its two
//! invariants:
//!
//! - rows are sorted ascending by (`scraped_datetime`, `rank`)
//! - the pair (`scraped_datetime`, `rank`) is unique
//!
//! Existing rows are placed before new ones and the sort is stable, so when
//! a cycle is re-ingested the row already on disk wins.

#[cfg(test)]
pub mod tests;

use crate::app::models::{HistoricalDataset, HistoryRow, RankingBatch};
use tracing::{debug, info};

/// Result of merging one batch into the history
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    /// Updated history
    pub dataset: HistoricalDataset,

    /// The batch as written, every row tagged with the batch timestamp
    pub batch_rows: Vec<HistoryRow>,

    /// Rows the history grew by
    pub rows_added: usize,

    /// Rows discarded as duplicate (`scraped_datetime`, `rank`) pairs
    pub duplicates_dropped: usize,
}

/// Tag every record of a batch with the batch's shared capture time
pub fn tag_batch(batch: &RankingBatch) -> Vec<HistoryRow> {
    batch
        .records
        .iter()
        .cloned()
        .map(|record| HistoryRow::new(batch.scraped_datetime, record))
        .collect()
}

/// Merge one batch into an existing (possibly empty) history
pub fn merge_batch(existing: HistoricalDataset, batch: &RankingBatch) -> MergeOutcome {
    let before = existing.len();
    let batch_rows = tag_batch(batch);

    let mut rows = existing.into_rows();
    rows.extend(batch_rows.iter().cloned());

    let (dataset, duplicates_dropped) = sort_and_deduplicate(rows);
    let rows_added = dataset.len().saturating_sub(before);

    info!(
        "merge: {} batch row(s) at {} -> {} added, {} duplicate(s) dropped, {} total",
        batch_rows.len(),
        batch.scraped_datetime,
        rows_added,
        duplicates_dropped,
        dataset.len()
    );

    MergeOutcome {
        dataset,
        batch_rows,
        rows_added,
        duplicates_dropped,
    }
}

/// Merge several batches, in the order given, into an existing history
pub fn merge_batches(existing: HistoricalDataset, batches: &[RankingBatch]) -> MergeOutcome {
    let before = existing.len();
    let mut rows = existing.into_rows();
    let mut batch_rows = Vec::new();

    for batch in batches {
        batch_rows.extend(tag_batch(batch));
    }
    rows.extend(batch_rows.iter().cloned());

    let (dataset, duplicates_dropped) = sort_and_deduplicate(rows);
    let rows_added = dataset.len().saturating_sub(before);

    info!(
        "merge: {} batch(es), {} row(s) -> {} added, {} duplicate(s) dropped, {} total",
        batches.len(),
        batch_rows.len(),
        rows_added,
        duplicates_dropped,
        dataset.len()
    );

    MergeOutcome {
        dataset,
        batch_rows,
        rows_added,
        duplicates_dropped,
    }
}

/// Rebuild the dataset invariants over arbitrary rows
///
/// Sorts stably by (`scraped_datetime`, `rank`) and keeps the first row of
/// every duplicate key. Returns the dataset and the number of rows dropped.
pub fn sort_and_deduplicate(mut rows: Vec<HistoryRow>) -> (HistoricalDataset, usize) {
    let total = rows.len();

    rows.sort_by(HistoryRow::cmp_key);
    rows.dedup_by(|later, earlier| later.same_key(earlier));

    let dropped = total - rows.len();
    if dropped > 0 {
        debug!("merge: dropped {} duplicate (scraped_datetime, rank) row(s)", dropped);
    }

    (HistoricalDataset::from_sorted_rows(rows), dropped)
}

/// Check the ordering and uniqueness invariants of a row sequence
pub fn is_sorted_and_unique(rows: &[HistoryRow]) -> bool {
    rows.windows(2)
        .all(|pair| pair[0].cmp_key(&pair[1]) == std::cmp::Ordering::Less)
}
