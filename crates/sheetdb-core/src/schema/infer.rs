//! Type inference engine and schema builder.
//!
//! Inference is a pure function of the observed cells: each non-missing
//! cell is classified as the most specific [`ColumnType`] that can
//! represent it, and the per-cell candidates are merged through the
//! widening lattice. A column of only missing cells infers as text.
//! Inference never fails.

use chrono::{NaiveDate, NaiveDateTime};

use crate::cell::Cell;
use crate::sheet::Sheet;

use super::column_type::ColumnType;
use super::table_schema::{Column, SchemaError, TableSchema};

/// Date/time patterns accepted during inference and text parsing.
///
/// The first pattern is the canonical export format, so exported tables
/// re-infer their datetime columns on ingestion.
const DATETIME_PATTERNS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Date-only pattern, parsed as midnight.
const DATE_PATTERN: &str = "%Y-%m-%d";

/// Parse a text value under the fixed set of accepted date/time patterns.
pub(crate) fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for pattern in DATETIME_PATTERNS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, DATE_PATTERN)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a text value from the recognized boolean set (case-insensitive).
pub(crate) fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") || text.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// Parse a text value as a whole number.
pub(crate) fn parse_int(text: &str) -> Option<i64> {
    text.trim().parse::<i64>().ok()
}

/// Parse a text value as a finite floating-point number.
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Most specific column type that can represent one text value.
fn lexical_type(text: &str) -> ColumnType {
    if parse_int(text).is_some() {
        ColumnType::Integer
    } else if parse_float(text).is_some() {
        ColumnType::Float
    } else if parse_bool(text).is_some() {
        ColumnType::Boolean
    } else if parse_datetime(text).is_some() {
        ColumnType::DateTime
    } else {
        ColumnType::Text
    }
}

/// Most specific column type for one cell, `None` for missing cells.
///
/// A workbook float with no fractional part counts as an Integer
/// candidate: spreadsheet readers report whole-number columns as floats.
fn cell_type(cell: &Cell) -> Option<ColumnType> {
    match cell {
        Cell::Int(_) => Some(ColumnType::Integer),
        Cell::Float(v) => {
            if v.is_finite() && v.fract() == 0.0 {
                Some(ColumnType::Integer)
            } else {
                Some(ColumnType::Float)
            }
        }
        Cell::Bool(_) => Some(ColumnType::Boolean),
        Cell::DateTime(_) => Some(ColumnType::DateTime),
        Cell::Text(s) => Some(lexical_type(s)),
        Cell::Missing => None,
    }
}

/// Infer the most specific compatible type for one column of cells.
///
/// A single non-conforming value anywhere in the column widens the result,
/// ultimately to [`ColumnType::Text`], which accepts anything.
pub fn infer_column_type<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> ColumnType {
    let mut merged: Option<ColumnType> = None;
    for cell in cells {
        if let Some(t) = cell_type(cell) {
            merged = Some(match merged {
                Some(prev) => prev.widen(t),
                None => t,
            });
            if merged == Some(ColumnType::Text) {
                break;
            }
        }
    }
    merged.unwrap_or(ColumnType::Text)
}

impl TableSchema {
    /// Build a schema for one tabular unit.
    ///
    /// Validates the header (trimming, blank and duplicate detection per
    /// [`TableSchema::new`]) and runs the inference engine over every
    /// column. Header order is preserved.
    pub fn infer(sheet: &Sheet) -> Result<TableSchema, SchemaError> {
        let columns = sheet
            .header()
            .iter()
            .enumerate()
            .map(|(idx, name)| Column::new(name.clone(), infer_column_type(sheet.column(idx))))
            .collect();
        TableSchema::new(columns)
    }
}
