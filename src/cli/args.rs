//! Command-line argument definitions for the hottest place scraper
//!
//! This module defines the CLI interface using the clap derive API and maps
//! parsed flags onto a validated [`ScraperConfig`].

use crate::Result;
use crate::config::{PayloadEncoding, ScraperConfig};
use crate::constants::{DEFAULT_ARCHIVE_DIR, DEFAULT_HISTORY_FILE};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for the hottest place scraper
///
/// Fetches a live weather ranking page, records the current hottest place
/// and appends the full ranking to a growing history table.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hottest-place",
    version,
    about = "Track the hottest place on Earth from a live weather ranking page",
    long_about = "Fetches a public live weather ranking page, extracts the ranking payload embedded \
                  in its source, writes a small snapshot of the current leader and appends every \
                  ranked location to a deduplicated, time-ordered history table."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Run one scrape cycle
    Run(RunArgs),
    /// Rebuild the history table from archived per-cycle batches
    Consolidate(ConsolidateArgs),
}

/// Arguments for the run command
#[derive(Debug, Clone, Parser)]
pub struct RunArgs {
    /// Ranking page URL
    #[arg(long = "url", value_name = "URL", help = "Ranking page URL")]
    pub url: Option<String>,

    /// Read the page from a saved file instead of fetching it
    ///
    /// Useful for offline runs and for replaying a page that broke extraction.
    #[arg(
        long = "page-file",
        value_name = "FILE",
        help = "Read the page from a saved file instead of fetching it"
    )]
    pub page_file: Option<PathBuf>,

    /// Substring that immediately precedes the ranking array
    #[arg(
        long = "marker",
        value_name = "TEXT",
        help = "Substring that immediately precedes the ranking array"
    )]
    pub marker: Option<String>,

    /// The payload is embedded verbatim rather than inside a JS string literal
    #[arg(long = "plain", help = "Payload is plain JSON, not escaped")]
    pub plain: bool,

    /// History CSV path
    #[arg(long = "history", value_name = "FILE", help = "History CSV path")]
    pub history: Option<PathBuf>,

    /// Leader snapshot JSON path
    #[arg(long = "snapshot", value_name = "FILE", help = "Leader snapshot JSON path")]
    pub snapshot: Option<PathBuf>,

    /// Also archive every batch as rankings_YYYYMMDD_HHMMSS.csv in this directory
    #[arg(
        long = "archive-dir",
        value_name = "DIR",
        help = "Archive each batch as its own CSV in this directory"
    )]
    pub archive_dir: Option<PathBuf>,

    /// Also mirror the history table to this Parquet file
    #[arg(
        long = "parquet",
        value_name = "FILE",
        help = "Mirror the history table to this Parquet file"
    )]
    pub parquet: Option<PathBuf>,

    /// Request attempts per fetch
    #[arg(
        long = "max-attempts",
        value_name = "COUNT",
        help = "Request attempts per fetch"
    )]
    pub max_attempts: Option<u32>,

    /// Whole-cycle attempts when fetching fails
    #[arg(
        long = "cycle-attempts",
        value_name = "COUNT",
        help = "Cycle attempts when fetching fails"
    )]
    pub cycle_attempts: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long = "timeout", value_name = "SECS", help = "Per-request timeout in seconds")]
    pub timeout: Option<u64>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Arguments for the consolidate command
#[derive(Debug, Clone, Parser)]
pub struct ConsolidateArgs {
    /// Directory holding rankings_YYYYMMDD_HHMMSS.csv files
    #[arg(
        long = "archive-dir",
        value_name = "DIR",
        default_value = DEFAULT_ARCHIVE_DIR,
        help = "Directory holding archived batches"
    )]
    pub archive_dir: PathBuf,

    /// History CSV to (re)write
    #[arg(
        long = "history",
        value_name = "FILE",
        default_value = DEFAULT_HISTORY_FILE,
        help = "History CSV to write"
    )]
    pub history: PathBuf,

    /// Also write the rebuilt table as Parquet
    #[arg(
        long = "parquet",
        value_name = "FILE",
        help = "Also write the rebuilt table as Parquet"
    )]
    pub parquet: Option<PathBuf>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Map verbosity flags onto a tracing level
fn log_level(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

impl RunArgs {
    /// Build the scraper configuration from defaults and flags
    pub fn to_config(&self) -> Result<ScraperConfig> {
        let mut config = ScraperConfig::default();

        if let Some(url) = &self.url {
            config = config.with_url(url.clone());
        }
        if let Some(marker) = &self.marker {
            config = config.with_marker(marker.clone());
        }
        if self.plain {
            config = config.with_encoding(PayloadEncoding::Plain);
        }
        if let Some(path) = &self.history {
            config = config.with_history_path(path.clone());
        }
        if let Some(path) = &self.snapshot {
            config = config.with_snapshot_path(path.clone());
        }
        if let Some(dir) = &self.archive_dir {
            config = config.with_archive_dir(dir.clone());
        }
        if let Some(path) = &self.parquet {
            config = config.with_parquet_path(path.clone());
        }
        if let Some(attempts) = self.max_attempts {
            config = config.with_fetch_attempts(attempts);
        }
        if let Some(attempts) = self.cycle_attempts {
            config = config.with_cycle_attempts(attempts);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout_secs(secs);
        }
        if self.page_file.is_some() {
            config = config.without_jitter();
        }

        config.validate()?;
        Ok(config)
    }

    /// Determine the log level from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.quiet, self.verbose)
    }

    /// Check if we should show a spinner (not in quiet mode)
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl ConsolidateArgs {
    /// Determine the log level from the verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        log_level(self.quiet, self.verbose)
    }
}
