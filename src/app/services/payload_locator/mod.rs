//! Ranking payload locator
//!
//! The ranking page ships its data as JSON embedded, escaped, inside the page
//! source. This module finds that JSON array and parses it into raw ranking
//! entries without a grammar for the host HTML/JS.
//!
//! # Algorithm
//!
//! 1. Find the configured marker substring.
//! 2. Find the first `[` after the marker.
//! 3. Scan forward with a string-aware [`scanner`] that counts nested `[`/`]`
//!    outside string literals and decodes `\"` and `\\` on the way.
//! 4. Parse the decoded text as a JSON array.
//!
//! Steps 1-3 fail with [`Error::PayloadNotFound`], step 4 with
//! [`Error::PayloadMalformed`]. Callers treat both as an empty batch.

pub mod scanner;

#[cfg(test)]
pub mod tests;

use crate::app::models::RawRankingEntry;
use crate::config::{PayloadEncoding, SourceConfig};
use crate::constants::PAYLOAD_EXCERPT_CHARS;
use crate::{Error, Result};
use std::fmt;
use tracing::{debug, warn};

pub use scanner::scan_balanced_array;

/// Why the payload could not be isolated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReason {
    /// Marker substring does not occur in the page
    MarkerAbsent,
    /// Nothing after the marker opens an array
    NoOpeningBracket,
    /// Page ends before the array closes
    Unbalanced,
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            MissingReason::MarkerAbsent => "marker not present in page",
            MissingReason::NoOpeningBracket => "no '[' follows the marker",
            MissingReason::Unbalanced => "array is not closed before the page ends",
        };
        f.write_str(reason)
    }
}

/// Finds and parses the ranking array embedded in raw page text
#[derive(Debug, Clone)]
pub struct PayloadLocator {
    marker: String,
    encoding: PayloadEncoding,
}

impl PayloadLocator {
    /// Create a locator for the given marker and encoding
    pub fn new(marker: impl Into<String>, encoding: PayloadEncoding) -> Self {
        Self {
            marker: marker.into(),
            encoding,
        }
    }

    /// Create a locator from source configuration
    pub fn from_config(config: &SourceConfig) -> Self {
        Self::new(config.marker.clone(), config.encoding)
    }

    /// Marker this locator searches for
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Isolate the payload array and return its decoded JSON text
    pub fn isolate(&self, page: &str) -> Result<String> {
        let marker_at = page
            .find(&self.marker)
            .ok_or(Error::payload_not_found(MissingReason::MarkerAbsent))?;
        let after_marker = &page[marker_at + self.marker.len()..];

        let open_at = after_marker
            .find('[')
            .ok_or(Error::payload_not_found(MissingReason::NoOpeningBracket))?;

        let json = scan_balanced_array(&after_marker[open_at..], self.encoding)
            .map_err(Error::payload_not_found)?;

        debug!(
            "Isolated ranking payload: {} chars at offset {}",
            json.len(),
            marker_at + self.marker.len() + open_at
        );
        Ok(json)
    }

    /// Locate and parse the ranking entries in raw page text
    ///
    /// Array elements that are not JSON objects are skipped with a warning.
    pub fn locate(&self, page: &str) -> Result<Vec<RawRankingEntry>> {
        let json = self.isolate(page)?;

        let values: Vec<serde_json::Value> = serde_json::from_str(&json)
            .map_err(|e| Error::payload_malformed(excerpt(&json), e))?;

        let total = values.len();
        let entries: Vec<RawRankingEntry> = values
            .into_iter()
            .filter_map(|value| match value {
                serde_json::Value::Object(entry) => Some(entry),
                _ => None,
            })
            .collect();

        if entries.len() < total {
            warn!(
                "locate: skipped {} non-object element(s) of {} in ranking payload",
                total - entries.len(),
                total
            );
        }

        Ok(entries)
    }
}

/// Leading slice of a payload for diagnostics
fn excerpt(json: &str) -> String {
    let mut excerpt: String = json.chars().take(PAYLOAD_EXCERPT_CHARS).collect();
    if json.chars().count() > PAYLOAD_EXCERPT_CHARS {
        excerpt.push_str("...");
    }
    excerpt
}
