//! Conversion between records and polars DataFrames
//!
//! The history table is schemaless from the pipeline's point of view: columns
//! are the union of every record's fields. Each column's dtype is inferred
//! from its non-null values (all integers -> Int64, any float -> Float64, all
//! booleans -> Boolean, anything else -> String).
//!
//! CSV files are read back with every column as text and each cell typed on
//! its own. A cell only becomes a number or boolean when writing that value
//! again reproduces the exact same text, so reloading and rewriting a table
//! never alters what is stored (`007` stays text, `45.5` becomes a float).

use crate::app::models::{FieldValue, HistoryRow, NormalizedRecord, record_columns};
use crate::constants::{HISTORY_TIME_FORMAT, fields};
use crate::{Error, Result};
use chrono::{NaiveDateTime, TimeZone, Utc};
use polars::prelude::*;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a FieldValue>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;

    for value in values {
        let value_kind = match value {
            FieldValue::Null => continue,
            FieldValue::Int(_) => ColumnKind::Int,
            FieldValue::Float(_) => ColumnKind::Float,
            FieldValue::Bool(_) => ColumnKind::Bool,
            FieldValue::Text(_) => return ColumnKind::Text,
        };

        kind = Some(match (kind, value_kind) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int), ColumnKind::Float)
            | (Some(ColumnKind::Float), ColumnKind::Int) => ColumnKind::Float,
            _ => return ColumnKind::Text,
        });
    }

    kind.unwrap_or(ColumnKind::Text)
}

fn build_column(name: &str, values: &[Option<&FieldValue>]) -> Column {
    let kind = infer_kind(values.iter().flatten().copied());

    match kind {
        ColumnKind::Int => Column::new(
            name.into(),
            values
                .iter()
                .map(|value| value.and_then(FieldValue::as_i64))
                .collect::<Vec<Option<i64>>>(),
        ),
        ColumnKind::Float => Column::new(
            name.into(),
            values
                .iter()
                .map(|value| value.and_then(FieldValue::as_f64))
                .collect::<Vec<Option<f64>>>(),
        ),
        ColumnKind::Bool => Column::new(
            name.into(),
            values
                .iter()
                .map(|value| value.and_then(FieldValue::as_bool))
                .collect::<Vec<Option<bool>>>(),
        ),
        ColumnKind::Text => Column::new(
            name.into(),
            values
                .iter()
                .map(|value| value.filter(|value| !value.is_null()).map(cell_text))
                .collect::<Vec<Option<String>>>(),
        ),
    }
}

/// Text written for a value in a text column
///
/// Floats keep their fractional part (`45.0`, not `45`) so they read back
/// as floats.
fn cell_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(value) => format!("{:?}", value),
        other => other.to_string(),
    }
}

/// Type one CSV cell without changing its text
pub fn scalar_from_cell(text: &str) -> FieldValue {
    match text {
        "true" => return FieldValue::Bool(true),
        "false" => return FieldValue::Bool(false),
        _ => {}
    }

    if let Ok(value) = text.parse::<i64>() {
        if value.to_string() == text {
            return FieldValue::Int(value);
        }
    } else if let Ok(value) = text.parse::<f64>() {
        if format!("{:?}", value) == text {
            return FieldValue::Float(value);
        }
    }

    FieldValue::from(text)
}

/// Read a CSV file with a header, every column as `String`
pub fn read_text_csv(path: &Path) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
}

/// Build a frame from records alone (per-cycle archive layout)
pub fn records_to_frame(records: &[NormalizedRecord]) -> Result<DataFrame> {
    let columns = record_columns(records.iter())
        .iter()
        .map(|name| {
            let values: Vec<Option<&FieldValue>> =
                records.iter().map(|record| record.get(name)).collect();
            build_column(name, &values)
        })
        .collect::<Vec<Column>>();

    Ok(DataFrame::new(columns)?)
}

/// Build a frame from history rows, `scraped_datetime` first
pub fn rows_to_frame(rows: &[HistoryRow]) -> Result<DataFrame> {
    let timestamps: Vec<String> = rows.iter().map(HistoryRow::formatted_datetime).collect();
    let mut columns = vec![Column::new(fields::SCRAPED_DATETIME.into(), timestamps)];

    for name in record_columns(rows.iter().map(|row| &row.record))
        .into_iter()
        .filter(|name| name != fields::SCRAPED_DATETIME)
    {
        let values: Vec<Option<&FieldValue>> =
            rows.iter().map(|row| row.record.get(&name)).collect();
        columns.push(build_column(&name, &values));
    }

    Ok(DataFrame::new(columns)?)
}

/// Values of one column as scalars
fn column_values(column: &Column) -> Result<Vec<FieldValue>> {
    let series = column.as_materialized_series();
    let dtype = series.dtype().clone();

    let values = if dtype.is_integer() {
        let cast = series.cast(&DataType::Int64)?;
        cast.i64()?
            .into_iter()
            .map(|value| value.map_or(FieldValue::Null, FieldValue::Int))
            .collect()
    } else if dtype.is_float() {
        let cast = series.cast(&DataType::Float64)?;
        cast.f64()?
            .into_iter()
            .map(|value| value.map_or(FieldValue::Null, FieldValue::Float))
            .collect()
    } else if dtype == DataType::Boolean {
        series
            .bool()?
            .into_iter()
            .map(|value| value.map_or(FieldValue::Null, FieldValue::Bool))
            .collect()
    } else {
        let cast = series.cast(&DataType::String)?;
        cast.str()?
            .into_iter()
            .map(|value| value.map_or(FieldValue::Null, |text| FieldValue::from(text)))
            .collect()
    };

    Ok(values)
}

/// Read every record of a frame; null cells become absent fields
pub fn frame_to_records(df: &DataFrame) -> Result<Vec<NormalizedRecord>> {
    let mut records = vec![NormalizedRecord::new(); df.height()];

    for column in df.get_columns() {
        let name = column.name().as_str();
        for (record, value) in records.iter_mut().zip(column_values(column)?) {
            if !value.is_null() {
                record.insert(name, value);
            }
        }
    }

    Ok(records)
}

/// Read every record of a text-only frame, typing each cell on its own
pub fn text_frame_to_records(df: &DataFrame) -> Result<Vec<NormalizedRecord>> {
    let mut records = vec![NormalizedRecord::new(); df.height()];

    for column in df.get_columns() {
        let name = column.name().as_str();
        let cells = column.as_materialized_series().cast(&DataType::String)?;
        for (record, cell) in records.iter_mut().zip(cells.str()?.into_iter()) {
            if let Some(text) = cell {
                record.insert(name, scalar_from_cell(text));
            }
        }
    }

    Ok(records)
}

/// Parse a `scraped_datetime` cell
pub fn parse_scraped_datetime(text: &str) -> Result<chrono::DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), HISTORY_TIME_FORMAT).map_err(|e| {
        Error::datetime_parsing(format!("Invalid scraped_datetime '{}'", text), e)
    })?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Read history rows from a frame
///
/// The frame must carry a `scraped_datetime` column. Rows whose timestamp
/// cannot be parsed are skipped with a warning.
pub fn frame_to_rows(df: &DataFrame) -> Result<Vec<HistoryRow>> {
    rows_from_frame(df, frame_to_records)
}

/// Read history rows from a text-only frame, as loaded by [`read_text_csv`]
pub fn text_frame_to_rows(df: &DataFrame) -> Result<Vec<HistoryRow>> {
    rows_from_frame(df, text_frame_to_records)
}

fn rows_from_frame(
    df: &DataFrame,
    read_records: fn(&DataFrame) -> Result<Vec<NormalizedRecord>>,
) -> Result<Vec<HistoryRow>> {
    let timestamps = df
        .column(fields::SCRAPED_DATETIME)
        .map_err(|_| {
            Error::storage(
                "<frame>",
                format!("history table has no '{}' column", fields::SCRAPED_DATETIME),
            )
        })?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let timestamps: Vec<Option<String>> = timestamps
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();

    let records = read_records(&df.drop(fields::SCRAPED_DATETIME)?)?;

    let mut rows = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for (timestamp, record) in timestamps.into_iter().zip(records) {
        match timestamp.as_deref().map(parse_scraped_datetime) {
            Some(Ok(scraped_datetime)) => rows.push(HistoryRow::new(scraped_datetime, record)),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            "persist: skipped {} history row(s) with an unreadable scraped_datetime",
            skipped
        );
    }

    Ok(rows)
}
