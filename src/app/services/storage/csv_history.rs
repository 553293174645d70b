//! History table stored as a single CSV file

use super::frame::{read_text_csv, rows_to_frame, text_frame_to_rows};
use super::{HistoryStore, write_atomically};
use crate::app::models::HistoricalDataset;
use crate::app::services::dataset_merger::sort_and_deduplicate;
use crate::{Error, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// CSV file holding the full history, rewritten every cycle
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
}

impl CsvHistoryStore {
    /// Create a store backed by `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for CsvHistoryStore {
    fn load(&self) -> Result<HistoricalDataset> {
        if !self.path.exists() {
            debug!("No history at {}, starting fresh", self.path.display());
            return Ok(HistoricalDataset::empty());
        }

        let df = read_text_csv(&self.path).map_err(|e| {
            Error::storage_with_source(
                self.path.display().to_string(),
                "failed to parse history CSV",
                e,
            )
        })?;

        let rows = text_frame_to_rows(&df)?;

        // Hand-edited or foreign files may break the invariants; repair on read
        let (dataset, dropped) = sort_and_deduplicate(rows);
        if dropped > 0 {
            warn!(
                "persist: history at {} contained {} duplicate row(s)",
                self.path.display(),
                dropped
            );
        }

        Ok(dataset)
    }

    fn save(&self, dataset: &HistoricalDataset) -> Result<()> {
        let mut df = rows_to_frame(dataset.rows())?;

        write_atomically(&self.path, |file| {
            CsvWriter::new(file)
                .include_header(true)
                .finish(&mut df)
                .map_err(|e| {
                    Error::storage_with_source(
                        self.path.display().to_string(),
                        "failed to write history CSV",
                        e,
                    )
                })
        })?;

        debug!(
            "Wrote {} history row(s) to {}",
            dataset.len(),
            self.path.display()
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
