//! The tabular unit: one header-plus-rows block.
//!
//! A [`Sheet`] is what the readers produce (one per CSV file, one per
//! worksheet of a workbook) and what the ingestion pipeline consumes.

use snafu::prelude::*;

use crate::cell::Cell;

/// Errors raised while assembling a tabular unit.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum SheetError {
    /// A data row has a different number of cells than the header.
    #[snafu(display(
        "Row {row} of '{sheet}' has {found} cells, header has {expected}"
    ))]
    RaggedRow {
        /// Sheet name.
        sheet: String,
        /// One-based data row number.
        row: usize,
        /// Header width.
        expected: usize,
        /// Actual cell count of the row.
        found: usize,
    },

    /// A sheet must have a header row.
    #[snafu(display("Sheet '{sheet}' has no header row"))]
    NoHeader {
        /// Sheet name.
        sheet: String,
    },
}

/// A named block of tabular data: a header row plus zero or more data
/// rows of raw cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    name: String,
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Construct a sheet, validating that every row matches the header
    /// width.
    pub fn new(
        name: impl Into<String>,
        header: Vec<String>,
        rows: Vec<Vec<Cell>>,
    ) -> Result<Self, SheetError> {
        let name = name.into();
        if header.is_empty() {
            return NoHeaderSnafu { sheet: name }.fail();
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != header.len() {
                return RaggedRowSnafu {
                    sheet: name,
                    row: i + 1,
                    expected: header.len(),
                    found: row.len(),
                }
                .fail();
            }
        }
        Ok(Sheet { name, header, rows })
    }

    /// The unit's name (file stem for CSV, worksheet name for workbooks).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the unit (used when ingesting under an explicit table name).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The header cells in source order.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// The data rows beneath the header.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterate one column's cells top to bottom.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().map(move |row| &row[index])
    }
}
