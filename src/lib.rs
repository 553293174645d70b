//! Hottest Place Library
//!
//! A Rust library for tracking the hottest place on Earth from a public live
//! weather ranking page.
//!
//! This library provides tools for:
//! - Locating the ranking payload embedded, escaped, inside raw page source
//! - Flattening nested ranking entries into flat tabular records
//! - Projecting the rank 1 entry into a small leader snapshot
//! - Merging each batch into a deduplicated, time-ordered history table
//! - Persisting the history as CSV (plus best-effort Parquet and per-cycle archives)
//! - Fetching the page with randomized headers and retry with backoff

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod dataset_merger;
        pub mod fetcher;
        pub mod payload_locator;
        pub mod pipeline;
        pub mod record_normalizer;
        pub mod snapshot_projector;
        pub mod storage;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{
    FieldValue, HistoricalDataset, HistoryRow, LeaderSnapshot, NormalizedRecord, RankingBatch,
    RawRankingEntry,
};
pub use app::services::payload_locator::MissingReason;
pub use config::ScraperConfig;

/// Result type alias for the hottest place scraper
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for scraping, extraction and persistence
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Page could not be fetched after exhausting all attempts
    #[error("Fetch failed for '{url}' after {attempts} attempt(s): {message}")]
    Fetch {
        url: String,
        attempts: u32,
        message: String,
    },

    /// Server answered with a status that is not worth retrying
    #[error("HTTP status {status} from '{url}'")]
    HttpStatus { url: String, status: u16 },

    /// Embedded ranking payload could not be isolated from the page
    #[error("Ranking payload not found: {reason}")]
    PayloadNotFound { reason: MissingReason },

    /// Payload was isolated but is not valid JSON
    #[error("Ranking payload malformed: {message}")]
    PayloadMalformed {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Persistence to a storage location failed
    #[error("Storage error at '{path}': {message}")]
    Storage {
        path: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Tabular conversion or CSV/Parquet I/O failed
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Date/time parsing error
    #[error("Date/time parsing error: {message}")]
    DateTimeParsing {
        message: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    Interrupted { reason: String },
}

impl Error {
    /// Create a fetch exhaustion error
    pub fn fetch(url: impl Into<String>, attempts: u32, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            attempts,
            message: message.into(),
        }
    }

    /// Create a non-retryable HTTP status error
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Create a payload-not-found error
    pub fn payload_not_found(reason: MissingReason) -> Self {
        Self::PayloadNotFound { reason }
    }

    /// Create a malformed payload error
    pub fn payload_malformed(message: impl Into<String>, source: serde_json::Error) -> Self {
        Self::PayloadMalformed {
            message: message.into(),
            source,
        }
    }

    /// Create a storage error without an underlying source
    pub fn storage(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error wrapping the underlying failure
    pub fn storage_with_source(
        path: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a date/time parsing error
    pub fn datetime_parsing(message: impl Into<String>, source: chrono::ParseError) -> Self {
        Self::DateTimeParsing {
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a processing interrupted error
    pub fn interrupted(reason: impl Into<String>) -> Self {
        Self::Interrupted {
            reason: reason.into(),
        }
    }

    /// Extraction failures degrade to an empty batch instead of failing the cycle
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            Self::PayloadNotFound { .. } | Self::PayloadMalformed { .. }
        )
    }

    /// Fetch failures are the only ones retried at the cycle level
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<chrono::ParseError> for Error {
    fn from(error: chrono::ParseError) -> Self {
        Self::DateTimeParsing {
            message: "Date/time parsing failed".to_string(),
            source: error,
        }
    }
}
