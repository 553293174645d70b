//! Configuration management and validation.
//!
//! Provides configuration structures for the source page, the fetch
//! collaborator, cycle-level retries and output locations. Every path the
//! pipeline touches comes from here; nothing is hardcoded in the services.

use crate::constants::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_CYCLE_ATTEMPTS, DEFAULT_CYCLE_BACKOFF_MS,
    DEFAULT_FETCH_ATTEMPTS, DEFAULT_HISTORY_FILE, DEFAULT_INITIAL_BACKOFF_MS,
    DEFAULT_JITTER_MAX_MS, DEFAULT_JITTER_MIN_MS, DEFAULT_PAYLOAD_MARKER,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SNAPSHOT_FILE, DEFAULT_SOURCE_URL, USER_AGENTS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the ranking payload is encoded inside the page source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PayloadEncoding {
    /// JSON embedded in a JS string literal: quotes appear as `\"`, backslashes as `\\`
    #[default]
    Escaped,
    /// JSON embedded verbatim
    Plain,
}

/// Where the ranking page lives and how to find the payload in it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Page URL
    pub url: String,

    /// Substring immediately preceding the ranking array
    pub marker: String,

    /// Payload encoding
    pub encoding: PayloadEncoding,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            marker: DEFAULT_PAYLOAD_MARKER.to_string(),
            encoding: PayloadEncoding::Escaped,
        }
    }
}

/// Request-level behaviour of the HTTP fetcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Attempts per fetch before giving up
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub initial_backoff_ms: u64,

    /// Backoff growth per failed attempt
    pub backoff_multiplier: f64,

    /// Connect + read timeout per request
    pub timeout_secs: u64,

    /// Lower bound of the randomized pre-request delay
    pub jitter_min_ms: u64,

    /// Upper bound of the randomized pre-request delay
    pub jitter_max_ms: u64,

    /// User agents picked at random per request
    pub user_agents: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_FETCH_ATTEMPTS,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            jitter_min_ms: DEFAULT_JITTER_MIN_MS,
            jitter_max_ms: DEFAULT_JITTER_MAX_MS,
            user_agents: USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }
}

/// Whole-cycle retry behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleConfig {
    /// Cycle attempts when the fetch step fails
    pub max_attempts: u32,

    /// Delay after the first failed cycle, doubled each time
    pub backoff_ms: u64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_CYCLE_ATTEMPTS,
            backoff_ms: DEFAULT_CYCLE_BACKOFF_MS,
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Consolidated history CSV (primary)
    pub history_path: PathBuf,

    /// Leader snapshot JSON (primary)
    pub snapshot_path: PathBuf,

    /// Directory receiving one `rankings_YYYYMMDD_HHMMSS.csv` per cycle (best effort)
    pub archive_dir: Option<PathBuf>,

    /// Parquet mirror of the history table (best effort)
    pub parquet_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            archive_dir: None,
            parquet_path: None,
        }
    }
}

/// Global configuration for the scraper
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScraperConfig {
    pub source: SourceConfig,
    pub fetch: FetchConfig,
    pub cycle: CycleConfig,
    pub output: OutputConfig,
}

impl ScraperConfig {
    /// Set the page URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.source.url = url.into();
        self
    }

    /// Set the payload marker
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.source.marker = marker.into();
        self
    }

    /// Set the payload encoding
    pub fn with_encoding(mut self, encoding: PayloadEncoding) -> Self {
        self.source.encoding = encoding;
        self
    }

    /// Set request attempts per fetch
    pub fn with_fetch_attempts(mut self, attempts: u32) -> Self {
        self.fetch.max_attempts = attempts;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.fetch.timeout_secs = secs;
        self
    }

    /// Set cycle attempts
    pub fn with_cycle_attempts(mut self, attempts: u32) -> Self {
        self.cycle.max_attempts = attempts;
        self
    }

    /// Set the first cycle backoff delay
    pub fn with_cycle_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.cycle.backoff_ms = backoff_ms;
        self
    }

    /// Set the history CSV path
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output.history_path = path.into();
        self
    }

    /// Set the snapshot JSON path
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output.snapshot_path = path.into();
        self
    }

    /// Enable the per-cycle batch archive
    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output.archive_dir = Some(dir.into());
        self
    }

    /// Enable the Parquet mirror
    pub fn with_parquet_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output.parquet_path = Some(path.into());
        self
    }

    /// Disable the pre-request jitter (offline runs and tests)
    pub fn without_jitter(mut self) -> Self {
        self.fetch.jitter_min_ms = 0;
        self.fetch.jitter_max_ms = 0;
        self
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(Error::configuration("Source URL must not be empty"));
        }

        if self.source.marker.is_empty() {
            return Err(Error::configuration("Payload marker must not be empty"));
        }

        if self.fetch.max_attempts == 0 {
            return Err(Error::configuration(
                "Fetch attempts must be at least 1",
            ));
        }

        if self.cycle.max_attempts == 0 {
            return Err(Error::configuration(
                "Cycle attempts must be at least 1",
            ));
        }

        if self.fetch.backoff_multiplier < 1.0 {
            return Err(Error::configuration(format!(
                "Backoff multiplier must be >= 1.0, got {}",
                self.fetch.backoff_multiplier
            )));
        }

        if self.fetch.jitter_min_ms > self.fetch.jitter_max_ms {
            return Err(Error::configuration(format!(
                "Jitter range is inverted: {}ms > {}ms",
                self.fetch.jitter_min_ms, self.fetch.jitter_max_ms
            )));
        }

        if self.fetch.user_agents.is_empty() {
            return Err(Error::configuration(
                "At least one user agent is required",
            ));
        }

        Ok(())
    }
}
