//! Artifact persistence
//!
//! A cycle produces two artifacts: the full history table and the leader
//! snapshot. Their primary homes are the [`HistoryStore`] and the
//! [`SnapshotStore`]; a failure there fails the cycle. Secondary copies go
//! through a list of [`ArtifactSink`]s, each attempted independently with
//! failures logged and swallowed.
//!
//! # Implementations
//!
//! - [`csv_history::CsvHistoryStore`] - history table as CSV (primary)
//! - [`snapshot_file::JsonSnapshotFile`] - snapshot as pretty JSON (primary)
//! - [`parquet_mirror::ParquetMirror`] - history table as Parquet (best effort)
//! - [`batch_archive::BatchArchive`] - one CSV per cycle (best effort)
//! - [`memory::MemoryStore`] - in-memory history and snapshot store

pub mod batch_archive;
pub mod csv_history;
pub mod frame;
pub mod memory;
pub mod parquet_mirror;
pub mod snapshot_file;

#[cfg(test)]
pub mod tests;

use crate::{Error, Result};
use crate::app::models::{HistoricalDataset, LeaderSnapshot, RankingBatch};
use crate::config::OutputConfig;
use std::path::Path;
use tracing::{debug, error, warn};

pub use batch_archive::BatchArchive;
pub use csv_history::CsvHistoryStore;
pub use memory::MemoryStore;
pub use parquet_mirror::ParquetMirror;
pub use snapshot_file::JsonSnapshotFile;

/// Primary home of the history table
pub trait HistoryStore {
    /// Read the full history
    fn load(&self) -> Result<HistoricalDataset>;

    /// Replace the stored history with `dataset`
    fn save(&self, dataset: &HistoricalDataset) -> Result<()>;

    /// Where the history lives, for log messages
    fn describe(&self) -> String;

    /// Read the history, treating any failure as a cold start
    fn load_or_empty(&self) -> HistoricalDataset {
        match self.load() {
            Ok(dataset) => {
                debug!("Loaded {} history row(s) from {}", dataset.len(), self.describe());
                dataset
            }
            Err(e) => {
                warn!(
                    "persist: could not read history from {} ({}), starting from an empty history",
                    self.describe(),
                    e
                );
                HistoricalDataset::empty()
            }
        }
    }
}

/// Primary home of the leader snapshot
pub trait SnapshotStore {
    /// Replace the stored snapshot
    fn save_snapshot(&self, snapshot: &LeaderSnapshot) -> Result<()>;
}

/// Everything one successful cycle produced
#[derive(Debug, Clone, Copy)]
pub struct CycleArtifacts<'a> {
    pub dataset: &'a HistoricalDataset,
    pub batch: &'a RankingBatch,
    pub snapshot: &'a LeaderSnapshot,
}

/// Secondary, best-effort destination of cycle artifacts
pub trait ArtifactSink: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &str;

    /// Store the artifacts
    fn publish(&self, artifacts: &CycleArtifacts<'_>) -> Result<()>;
}

/// Outcome of publishing to every best-effort sink
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinkReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl SinkReport {
    /// Check that no sink failed
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Publish to every sink, isolating each failure
pub fn publish_best_effort(
    sinks: &[Box<dyn ArtifactSink>],
    artifacts: &CycleArtifacts<'_>,
) -> SinkReport {
    let mut report = SinkReport::default();

    for sink in sinks {
        match sink.publish(artifacts) {
            Ok(()) => {
                debug!("sink:{} published", sink.name());
                report.succeeded.push(sink.name().to_string());
            }
            Err(e) => {
                error!("sink:{} failed: {}", sink.name(), e);
                report.failed.push((sink.name().to_string(), e.to_string()));
            }
        }
    }

    report
}

/// Best-effort sinks enabled by the output configuration
pub fn build_sinks(output: &OutputConfig) -> Vec<Box<dyn ArtifactSink>> {
    let mut sinks: Vec<Box<dyn ArtifactSink>> = Vec::new();

    if let Some(dir) = &output.archive_dir {
        sinks.push(Box::new(BatchArchive::new(dir.clone())));
    }
    if let Some(path) = &output.parquet_path {
        sinks.push(Box::new(ParquetMirror::new(path.clone())));
    }

    sinks
}

/// Create the parent directory of `path` when it has one
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            Error::io(format!("Failed to create directory {}", parent.display()), e)
        })?;
    }
    Ok(())
}

/// Write through a sibling temp file and rename it over `path`
pub(crate) fn write_atomically(
    path: &Path,
    write: impl FnOnce(&mut std::fs::File) -> Result<()>,
) -> Result<()> {
    ensure_parent_dir(path)?;

    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = std::fs::File::create(&temp_path).map_err(|e| {
        Error::io(format!("Failed to create {}", temp_path.display()), e)
    })?;
    if let Err(e) = write(&mut file) {
        drop(file);
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }
    drop(file);

    std::fs::rename(&temp_path, path).map_err(|e| {
        Error::io(
            format!("Failed to move {} into place", temp_path.display()),
            e,
        )
    })
}
