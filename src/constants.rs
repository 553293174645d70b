//! Application constants for the hottest place scraper
//!
//! This module contains default values, fixed file names, column names and
//! the user-agent pool used throughout the application.

// =============================================================================
// Source Page
// =============================================================================

/// Live weather ranking page
pub const DEFAULT_SOURCE_URL: &str = "https://www.aqi.in/weather/live-ranking";

/// Substring that precedes the ranking array in the page's escaped JSON-in-HTML payload
pub const DEFAULT_PAYLOAD_MARKER: &str = r#"\"weatherRanking\":"#;

/// Characters of an isolated payload included in malformed-payload diagnostics
pub const PAYLOAD_EXCERPT_CHARS: usize = 160;

// =============================================================================
// Record Fields
// =============================================================================

/// Field names in raw ranking entries and normalized records
pub mod fields {
    pub const RANK: &str = "rank";
    pub const CITY: &str = "city";
    pub const COUNTRY: &str = "country";
    pub const FLAG: &str = "flag";
    pub const WEATHER: &str = "weather";
    pub const CONDITION: &str = "condition";
    pub const CONDITION_TEXT_SOURCE: &str = "text";
    pub const TEMP_C: &str = "temp_c";

    /// Derived from `weather.condition.text`
    pub const CONDITION_TEXT: &str = "condition_text";

    /// Derived from the flag URL's file stem
    pub const COUNTRY_CODE: &str = "country_code";

    /// Capture time of the batch a row belongs to
    pub const SCRAPED_DATETIME: &str = "scraped_datetime";
}

/// Text written into the snapshot when no numeric temperature is available
pub const TEMPERATURE_UNAVAILABLE: &str = "N/A";

/// Snapshot timestamp layout, e.g. `05 Jun 2024, 02:30 PM`
pub const SNAPSHOT_TIME_FORMAT: &str = "%d %b %Y, %I:%M %p";

/// `scraped_datetime` layout in the history table
pub const HISTORY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Output Files
// =============================================================================

/// Consolidated history table
pub const DEFAULT_HISTORY_FILE: &str = "consolidated_rankings.csv";

/// Leader snapshot consumed by the static front page
pub const DEFAULT_SNAPSHOT_FILE: &str = "data.json";

/// Directory the consolidate command reads archived batches from
pub const DEFAULT_ARCHIVE_DIR: &str = "Data";

/// Per-cycle batch file name layout inside the archive directory
pub const ARCHIVE_FILE_FORMAT: &str = "rankings_%Y%m%d_%H%M%S.csv";

/// Glob used to discover archived batches
pub const ARCHIVE_FILE_GLOB: &str = "rankings_*.csv";

/// Regex capturing date and time from an archived batch file name
pub const ARCHIVE_FILE_PATTERN: &str = r"^rankings_(\d{8})_(\d{6})\.csv$";

/// Date/time layout of the two captures of [`ARCHIVE_FILE_PATTERN`] joined with `_`
pub const ARCHIVE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// =============================================================================
// Fetch and Retry
// =============================================================================

/// Request attempts per fetch
pub const DEFAULT_FETCH_ATTEMPTS: u32 = 3;

/// First backoff delay between request attempts
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1_000;

/// Growth factor applied to the backoff after each failed attempt
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Connect + read timeout of one request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Randomized delay before every request
pub const DEFAULT_JITTER_MIN_MS: u64 = 500;
pub const DEFAULT_JITTER_MAX_MS: u64 = 2_000;

/// Whole-cycle attempts when the fetch step fails
pub const DEFAULT_CYCLE_ATTEMPTS: u32 = 3;

/// First backoff delay between cycle attempts
pub const DEFAULT_CYCLE_BACKOFF_MS: u64 = 2_000;

/// Browser user agents rotated across requests
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
];
