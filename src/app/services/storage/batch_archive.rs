//! Per-cycle batch archive
//!
//! Every successful cycle can additionally drop its own batch into a
//! directory as `rankings_YYYYMMDD_HHMMSS.csv`. The capture time lives only
//! in the file name; the archive can later be rebuilt into a history table
//! with [`BatchArchive::read_all`].

use super::frame::{read_text_csv, records_to_frame, text_frame_to_records};
use super::{ArtifactSink, CycleArtifacts, write_atomically};
use crate::app::models::RankingBatch;
use crate::constants::{
    ARCHIVE_FILE_FORMAT, ARCHIVE_FILE_GLOB, ARCHIVE_FILE_PATTERN, ARCHIVE_STAMP_FORMAT, fields,
};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory of per-cycle CSV files
#[derive(Debug, Clone)]
pub struct BatchArchive {
    dir: PathBuf,
}

/// Batches recovered from the archive
#[derive(Debug, Clone, Default)]
pub struct ArchiveScan {
    /// Readable batches, oldest first
    pub batches: Vec<RankingBatch>,

    /// Files that matched the glob but could not be used, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

impl BatchArchive {
    /// Create an archive rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Archive directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a batch captured at `scraped_datetime` is written to
    pub fn file_for(&self, scraped_datetime: DateTime<Utc>) -> PathBuf {
        self.dir
            .join(scraped_datetime.format(ARCHIVE_FILE_FORMAT).to_string())
    }

    /// Write one batch as its own CSV file
    pub fn write_batch(&self, batch: &RankingBatch) -> Result<PathBuf> {
        let path = self.file_for(batch.scraped_datetime);
        let mut df = records_to_frame(&batch.records)?;

        write_atomically(&path, |file| {
            CsvWriter::new(file)
                .include_header(true)
                .finish(&mut df)
                .map_err(|e| {
                    Error::storage_with_source(
                        path.display().to_string(),
                        "failed to write archived batch",
                        e,
                    )
                })
        })?;

        debug!("Archived {} record(s) to {}", batch.len(), path.display());
        Ok(path)
    }

    /// Read every archived batch
    ///
    /// Files whose name does not carry a valid capture time, or whose
    /// contents cannot be parsed, are skipped with a warning.
    pub fn read_all(&self) -> Result<ArchiveScan> {
        let pattern = self.dir.join(ARCHIVE_FILE_GLOB);
        let pattern = pattern.to_string_lossy();
        let name_pattern = Regex::new(ARCHIVE_FILE_PATTERN)
            .map_err(|e| Error::configuration(format!("Invalid archive file pattern: {}", e)))?;

        let paths = glob::glob(&pattern).map_err(|e| {
            Error::configuration(format!("Invalid archive glob '{}': {}", pattern, e))
        })?;

        let mut scan = ArchiveScan::default();

        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    warn!("consolidate: unreadable archive entry: {}", e);
                    scan.skipped.push((e.path().to_path_buf(), e.to_string()));
                    continue;
                }
            };

            match read_batch_file(&path, &name_pattern) {
                Ok(batch) => {
                    debug!(
                        "Read {} record(s) from {}",
                        batch.len(),
                        path.display()
                    );
                    scan.batches.push(batch);
                }
                Err(reason) => {
                    warn!("consolidate: skipping {}: {}", path.display(), reason);
                    scan.skipped.push((path, reason));
                }
            }
        }

        scan.batches.sort_by_key(|batch| batch.scraped_datetime);
        Ok(scan)
    }
}

/// Capture time encoded in an archive file name
pub fn capture_time_from_name(name: &str, pattern: &Regex) -> Option<DateTime<Utc>> {
    let captures = pattern.captures(name)?;
    let stamp = format!("{}_{}", &captures[1], &captures[2]);
    let naive = NaiveDateTime::parse_from_str(&stamp, ARCHIVE_STAMP_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

fn read_batch_file(path: &Path, name_pattern: &Regex) -> std::result::Result<RankingBatch, String> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let scraped_datetime = capture_time_from_name(&name, name_pattern)
        .ok_or_else(|| "file name does not encode a valid capture time".to_string())?;

    let mut df = read_text_csv(path).map_err(|e| e.to_string())?;

    // The file name is the capture time; a stored column must not compete with it
    if df.get_column_index(fields::SCRAPED_DATETIME).is_some() {
        debug!(
            "Ignoring '{}' column in {}",
            fields::SCRAPED_DATETIME,
            path.display()
        );
        df = df.drop(fields::SCRAPED_DATETIME).map_err(|e| e.to_string())?;
    }

    let records = text_frame_to_records(&df).map_err(|e| e.to_string())?;
    Ok(RankingBatch::new(records, scraped_datetime))
}

impl ArtifactSink for BatchArchive {
    fn name(&self) -> &str {
        "archive"
    }

    fn publish(&self, artifacts: &CycleArtifacts<'_>) -> Result<()> {
        self.write_batch(artifacts.batch).map(|_| ())
    }
}
