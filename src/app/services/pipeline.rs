//! Scrape cycle orchestration
//!
//! One cycle runs the stages strictly in order: fetch, locate, normalize,
//! project, merge, persist. Only the fetch stage is retried, and only at the
//! cycle level. Extraction failures and empty batches end the cycle as "no
//! data" without touching any stored artifact; the next scheduled run is the
//! retry for those.

use crate::app::models::{HistoricalDataset, LeaderSnapshot, RankingBatch};
use crate::app::services::dataset_merger::{merge_batch, merge_batches};
use crate::app::services::fetcher::{Backoff, PageSource};
use crate::app::services::payload_locator::PayloadLocator;
use crate::app::services::record_normalizer::normalize_entries;
use crate::app::services::snapshot_projector::project_leader;
use crate::app::services::storage::{
    ArtifactSink, BatchArchive, CycleArtifacts, HistoryStore, ParquetMirror, SinkReport,
    SnapshotStore, publish_best_effort,
};
use crate::config::{CycleConfig, ScraperConfig};
use crate::{Error, Result};
use chrono::{DateTime, SubsecRound, Utc};
use std::error::Error as _;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How a cycle ended
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// A non-empty batch was captured and both primary artifacts written
    Captured {
        snapshot: LeaderSnapshot,
        batch_size: usize,
        rows_added: usize,
        duplicates_dropped: usize,
        total_rows: usize,
        sinks: SinkReport,
    },

    /// Nothing was captured; stored artifacts are untouched
    NoData {
        stage: &'static str,
        reason: String,
    },
}

/// Summary of one cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub scraped_datetime: DateTime<Utc>,
    pub source: String,
    pub fetch_attempts: u32,
    pub outcome: CycleOutcome,
    pub elapsed: Duration,
}

impl CycleReport {
    /// Check whether the cycle captured data
    pub fn captured(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Captured { .. })
    }
}

/// Scrape pipeline over a page source and the two primary stores
pub struct ScrapePipeline<S, H, N> {
    source: S,
    history: H,
    snapshots: N,
    locator: PayloadLocator,
    cycle: CycleConfig,
    sinks: Vec<Box<dyn ArtifactSink>>,
}

impl<S, H, N> ScrapePipeline<S, H, N>
where
    S: PageSource,
    H: HistoryStore,
    N: SnapshotStore,
{
    /// Create a pipeline without best-effort sinks
    pub fn new(source: S, history: H, snapshots: N, config: &ScraperConfig) -> Self {
        Self {
            source,
            history,
            snapshots,
            locator: PayloadLocator::from_config(&config.source),
            cycle: config.cycle.clone(),
            sinks: Vec::new(),
        }
    }

    /// Attach best-effort sinks
    pub fn with_sinks(mut self, sinks: Vec<Box<dyn ArtifactSink>>) -> Self {
        self.sinks = sinks;
        self
    }

    /// History store
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Snapshot store
    pub fn snapshots(&self) -> &N {
        &self.snapshots
    }

    /// Run one full cycle captured now
    pub async fn run_once(&self) -> Result<CycleReport> {
        let started = Instant::now();
        let (page, fetch_attempts) = self.fetch_with_retry().await?;

        let scraped_datetime = Utc::now().trunc_subsecs(0);
        let outcome = self.process_page(&page, scraped_datetime)?;

        Ok(CycleReport {
            scraped_datetime,
            source: self.source.describe(),
            fetch_attempts,
            outcome,
            elapsed: started.elapsed(),
        })
    }

    /// Fetch the page, retrying the whole fetch step with exponential backoff
    ///
    /// Returns the page and the number of cycle attempts used. Errors other
    /// than fetch exhaustion are returned immediately.
    pub async fn fetch_with_retry(&self) -> Result<(String, u32)> {
        let backoff = Backoff::doubling(Duration::from_millis(self.cycle.backoff_ms));
        let max_attempts = self.cycle.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match self.source.fetch().await {
                Ok(page) => return Ok((page, attempt)),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = backoff.delay_after(attempt);
                    warn!(
                        "fetch: cycle attempt {}/{} failed ({}), retrying in {:?}",
                        attempt, max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        "fetch: giving up on {} after {} cycle attempt(s): {}",
                        self.source.describe(),
                        attempt,
                        e
                    );
                    return Err(e);
                }
            }
        }

        Err(Error::fetch(
            self.source.describe(),
            max_attempts,
            "no cycle attempt made",
        ))
    }

    /// Run every stage after fetching on already retrieved page text
    pub fn process_page(&self, page: &str, scraped_at: DateTime<Utc>) -> Result<CycleOutcome> {
        let entries = match self.locator.locate(page) {
            Ok(entries) => entries,
            Err(e) if e.is_extraction_failure() => {
                log_extraction_failure(&e);
                return Ok(CycleOutcome::NoData {
                    stage: "locate",
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let records = normalize_entries(&entries);
        let batch = RankingBatch::new(records, scraped_at);

        let Some(snapshot) = project_leader(&batch.records) else {
            warn!("project: ranking payload was empty, skipping cycle");
            return Ok(CycleOutcome::NoData {
                stage: "project",
                reason: "ranking payload contained no entries".to_string(),
            });
        };
        info!(
            "project: leader is {} ({}) at {}",
            snapshot.city, snapshot.country, snapshot.temperature
        );

        let existing = self.history.load_or_empty();
        let merged = merge_batch(existing, &batch);

        self.history.save(&merged.dataset)?;
        info!(
            "persist: {} row(s) written to {}",
            merged.dataset.len(),
            self.history.describe()
        );
        self.snapshots.save_snapshot(&snapshot)?;

        let sinks = publish_best_effort(
            &self.sinks,
            &CycleArtifacts {
                dataset: &merged.dataset,
                batch: &batch,
                snapshot: &snapshot,
            },
        );

        Ok(CycleOutcome::Captured {
            snapshot,
            batch_size: batch.len(),
            rows_added: merged.rows_added,
            duplicates_dropped: merged.duplicates_dropped,
            total_rows: merged.dataset.len(),
            sinks,
        })
    }
}

fn log_extraction_failure(e: &Error) {
    match e {
        Error::PayloadMalformed { message, source } => {
            error!(
                "locate: ranking payload is not valid JSON ({}); payload starts: {}",
                source, message
            );
        }
        other => {
            warn!(
                "locate: {} (cause: {:?})",
                other,
                other.source().map(ToString::to_string)
            );
        }
    }
}

// =============================================================================
// Consolidation
// =============================================================================

/// Summary of rebuilding the history from the batch archive
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidationReport {
    pub files_read: usize,
    pub files_skipped: Vec<(PathBuf, String)>,
    pub total_rows: usize,
    pub duplicates_dropped: usize,
    pub first_capture: DateTime<Utc>,
    pub last_capture: DateTime<Utc>,
}

/// Rebuild the history table from every archived batch
///
/// The rebuilt table replaces whatever `history` held. An optional Parquet
/// mirror receives the same table on a best-effort basis.
pub fn consolidate(
    archive: &BatchArchive,
    history: &impl HistoryStore,
    parquet: Option<&ParquetMirror>,
) -> Result<ConsolidationReport> {
    let scan = archive.read_all()?;
    debug!(
        "consolidate: {} archived batch(es), {} skipped in {}",
        scan.batches.len(),
        scan.skipped.len(),
        archive.dir().display()
    );

    let merged = merge_batches(HistoricalDataset::empty(), &scan.batches);
    let Some((first_capture, last_capture)) = merged.dataset.time_span() else {
        return Err(Error::storage(
            archive.dir().display().to_string(),
            "no valid data found to consolidate",
        ));
    };

    history.save(&merged.dataset)?;
    info!(
        "consolidate: {} row(s) from {} file(s) written to {}",
        merged.dataset.len(),
        scan.batches.len(),
        history.describe()
    );

    if let Some(mirror) = parquet {
        if let Err(e) = mirror.write_dataset(&merged.dataset) {
            error!("sink:parquet failed: {}", e);
        }
    }

    Ok(ConsolidationReport {
        files_read: scan.batches.len(),
        files_skipped: scan.skipped,
        total_rows: merged.dataset.len(),
        duplicates_dropped: merged.duplicates_dropped,
        first_capture,
        last_capture,
    })
}
