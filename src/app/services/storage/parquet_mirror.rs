//! Columnar copy of the history table

use super::frame::rows_to_frame;
use super::{ArtifactSink, CycleArtifacts, write_atomically};
use crate::app::models::HistoricalDataset;
use crate::{Error, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Snappy-compressed Parquet mirror of the full history
#[derive(Debug, Clone)]
pub struct ParquetMirror {
    path: PathBuf,
}

impl ParquetMirror {
    /// Create a mirror at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the mirror with `dataset`
    pub fn write_dataset(&self, dataset: &HistoricalDataset) -> Result<()> {
        let mut df = rows_to_frame(dataset.rows())?;

        write_atomically(&self.path, |file| {
            ParquetWriter::new(file)
                .with_compression(ParquetCompression::Snappy)
                .with_statistics(StatisticsOptions::full())
                .finish(&mut df)
                .map(|_| ())
                .map_err(|e| {
                    Error::storage_with_source(
                        self.path.display().to_string(),
                        "failed to write Parquet mirror",
                        e,
                    )
                })
        })?;

        debug!(
            "Mirrored {} history row(s) to {}",
            dataset.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Read the mirror back as a DataFrame
    pub fn read_frame(&self) -> Result<DataFrame> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| Error::io(format!("Failed to open {}", self.path.display()), e))?;
        Ok(ParquetReader::new(file).finish()?)
    }
}

impl ArtifactSink for ParquetMirror {
    fn name(&self) -> &str {
        "parquet"
    }

    fn publish(&self, artifacts: &CycleArtifacts<'_>) -> Result<()> {
        self.write_dataset(artifacts.dataset)
    }
}
