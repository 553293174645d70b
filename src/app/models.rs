//! Data models for ranking capture
//!
//! This module contains the core data structures that flow through one scrape
//! cycle: raw ranking entries as delivered by the page, flat normalized
//! records, the batch a cycle produces, the cumulative history table and the
//! leader snapshot.

use crate::constants::{HISTORY_TIME_FORMAT, fields};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// One ranking entry exactly as the source delivered it
///
/// Upstream fields vary over time, so entries stay untyped JSON objects.
pub type RawRankingEntry = serde_json::Map<String, serde_json::Value>;

// =============================================================================
// Scalar Field Values
// =============================================================================

/// Scalar value of one normalized field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric view of the value; text is never coerced
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(value) => Some(*value as f64),
            FieldValue::Float(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    /// Integer view of the value, accepting integral floats and numeric text
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(value) => Some(*value),
            FieldValue::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                Some(*value as i64)
            }
            FieldValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean view of the value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Borrow the value as text when it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(value) => write!(f, "{}", value),
            FieldValue::Int(value) => write!(f, "{}", value),
            FieldValue::Float(value) => write!(f, "{}", value),
            FieldValue::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

// =============================================================================
// Normalized Record
// =============================================================================

/// Flat field-to-scalar mapping produced from one ranking entry
///
/// Field order carries no meaning; keys iterate in sorted order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl NormalizedRecord {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Remove a field, returning its value
    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Check whether a field is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Field names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Iterate fields in sorted key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.fields.iter()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check for a record without fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Rank of the entry, if it carries an integer one
    pub fn rank(&self) -> Option<i64> {
        self.get(fields::RANK).and_then(FieldValue::as_i64)
    }

    /// Text field, ignoring non-text values
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    /// Numeric field
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for NormalizedRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

// =============================================================================
// Ranking Batch
// =============================================================================

/// One fetch cycle's worth of normalized records sharing a single capture time
#[derive(Debug, Clone, PartialEq)]
pub struct RankingBatch {
    /// Capture time, UTC, whole seconds
    pub scraped_datetime: DateTime<Utc>,

    /// Records in the order the source presented them
    pub records: Vec<NormalizedRecord>,
}

impl RankingBatch {
    /// Create a batch captured at the given time (truncated to whole seconds)
    pub fn new(records: Vec<NormalizedRecord>, scraped_datetime: DateTime<Utc>) -> Self {
        Self {
            scraped_datetime: scraped_datetime.trunc_subsecs(0),
            records,
        }
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check for an empty batch
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// Historical Dataset
// =============================================================================

/// One row of the history table
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub scraped_datetime: DateTime<Utc>,
    pub record: NormalizedRecord,
}

impl HistoryRow {
    /// Create a row
    ///
    /// `scraped_datetime` is reserved for the row's own capture time, so a
    /// record field of that name is dropped.
    pub fn new(scraped_datetime: DateTime<Utc>, mut record: NormalizedRecord) -> Self {
        record.remove(fields::SCRAPED_DATETIME);
        Self {
            scraped_datetime,
            record,
        }
    }

    /// Rank of the row
    pub fn rank(&self) -> Option<i64> {
        self.record.rank()
    }

    /// Compare rows by (`scraped_datetime`, `rank`); unranked rows sort last
    pub fn cmp_key(&self, other: &Self) -> Ordering {
        self.scraped_datetime
            .cmp(&other.scraped_datetime)
            .then_with(|| match (self.rank(), other.rank()) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    }

    /// Check whether two rows share (`scraped_datetime`, `rank`)
    pub fn same_key(&self, other: &Self) -> bool {
        self.cmp_key(other) == Ordering::Equal
    }

    /// `scraped_datetime` rendered the way the history table stores it
    pub fn formatted_datetime(&self) -> String {
        self.scraped_datetime.format(HISTORY_TIME_FORMAT).to_string()
    }
}

/// Cumulative table of every normalized record ever captured
///
/// Rows are kept sorted by (`scraped_datetime`, `rank`) with that pair unique;
/// the dataset merger is the only producer of new datasets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistoricalDataset {
    rows: Vec<HistoryRow>,
}

impl HistoricalDataset {
    /// Create an empty dataset
    pub fn empty() -> Self {
        Self::default()
    }

    /// Wrap rows that already satisfy the ordering and uniqueness invariants
    pub(crate) fn from_sorted_rows(rows: Vec<HistoryRow>) -> Self {
        Self { rows }
    }

    /// Rows in ascending (`scraped_datetime`, `rank`) order
    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    /// Consume the dataset into its rows
    pub fn into_rows(self) -> Vec<HistoryRow> {
        self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check for an empty dataset
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names: `scraped_datetime`, `rank`, then every other field sorted
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![fields::SCRAPED_DATETIME.to_string()];
        columns.extend(
            record_columns(self.rows.iter().map(|row| &row.record))
                .into_iter()
                .filter(|name| name != fields::SCRAPED_DATETIME),
        );
        columns
    }

    /// Earliest and latest capture times
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.rows.first()?;
        let last = self.rows.last()?;
        Some((first.scraped_datetime, last.scraped_datetime))
    }

    /// Number of distinct capture times
    pub fn cycle_count(&self) -> usize {
        let mut count = 0;
        let mut previous = None;
        for row in &self.rows {
            if previous != Some(row.scraped_datetime) {
                count += 1;
                previous = Some(row.scraped_datetime);
            }
        }
        count
    }
}

/// Union of record fields: `rank` first when present, then the rest sorted
pub fn record_columns<'a>(records: impl Iterator<Item = &'a NormalizedRecord>) -> Vec<String> {
    let mut names = std::collections::BTreeSet::new();
    for record in records {
        names.extend(record.keys().map(str::to_string));
    }

    let mut columns = Vec::with_capacity(names.len());
    if names.remove(fields::RANK) {
        columns.push(fields::RANK.to_string());
    }
    columns.extend(names);
    columns
}

// =============================================================================
// Leader Snapshot
// =============================================================================

/// Summary of the current rank 1 location, overwritten every cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderSnapshot {
    pub city: String,
    pub country: String,
    pub country_code: String,
    /// `"<value> °C"` or `"N/A"`
    pub temperature: String,
    pub condition: String,
    /// Projection time, e.g. `05 Jun 2024, 02:30 PM` (UTC)
    pub last_updated: String,
}
