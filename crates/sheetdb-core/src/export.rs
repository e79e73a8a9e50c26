//! Export writers: table contents back to CSV and workbook files.
//!
//! Exports always go through batches already aligned to the registered
//! schema, so column order matches the schema and widened columns are
//! uniform. CSV renders datetimes in the canonical text format; workbook
//! export writes native number/boolean/datetime cells.

use std::fs::File;
use std::io;
use std::path::Path;

use arrow::array::{
    Array, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray,
    TimestampMicrosecondArray,
};
use arrow::error::ArrowError;
use chrono::DateTime;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use snafu::prelude::*;

use crate::cell::DATETIME_FORMAT;
use crate::schema::{ColumnType, TableSchema};

/// Number format applied to datetime cells in workbook exports.
const EXCEL_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Worksheet names are capped by the format itself.
const MAX_SHEET_NAME_LEN: usize = 31;

/// Errors raised while writing export files.
#[derive(Debug, Snafu)]
pub enum ExportError {
    /// Creating or writing the target file failed.
    #[snafu(display("Failed to write export file {path}: {source}"))]
    Io {
        /// The target path.
        path: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The CSV writer failed.
    #[snafu(display("CSV export failed: {source}"))]
    Csv {
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// The workbook writer failed.
    #[snafu(display("Workbook export failed: {source}"))]
    Workbook {
        /// Underlying workbook writer error.
        source: XlsxError,
    },
}

/// Result alias for export operations.
pub type ExportResult<T> = Result<T, ExportError>;

/// Options for exporting every table of a database to CSV files.
#[derive(Debug, Clone)]
pub struct CsvExportOptions {
    /// Table names to leave out of the export.
    pub exclude: Vec<String>,
    /// Prefix each file name with the database name
    /// (`<db>_<table>.csv` instead of `<table>.csv`).
    pub include_db_name: bool,
}

impl Default for CsvExportOptions {
    fn default() -> Self {
        CsvExportOptions {
            exclude: Vec::new(),
            include_db_name: true,
        }
    }
}

/// Options for exporting every table of a database to one workbook.
#[derive(Debug, Clone, Default)]
pub struct ExcelExportOptions {
    /// Table names to leave out of the export.
    pub exclude: Vec<String>,
}

/// Write aligned batches to a CSV file with a header row.
pub fn write_csv_file(path: &Path, batches: &[RecordBatch]) -> ExportResult<()> {
    let file = File::create(path).context(IoSnafu {
        path: path.display().to_string(),
    })?;

    let mut writer = arrow_csv::WriterBuilder::new()
        .with_header(true)
        .with_timestamp_format(DATETIME_FORMAT.to_string())
        .build(file);

    for batch in batches {
        writer.write(batch).context(CsvSnafu)?;
    }
    Ok(())
}

/// Write one worksheet per table into a workbook file.
///
/// Each entry is a table name, its registered schema, and its aligned
/// batches. Null cells stay blank.
pub fn write_excel_file(
    path: &Path,
    tables: &[(String, TableSchema, Vec<RecordBatch>)],
) -> ExportResult<()> {
    let mut workbook = Workbook::new();
    let datetime_format = Format::new().set_num_format(EXCEL_DATETIME_FORMAT);

    for (name, schema, batches) in tables {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(worksheet_name(name))
            .context(WorkbookSnafu)?;

        for (col, column) in schema.columns().iter().enumerate() {
            worksheet
                .write_string(0, col as u16, &column.name)
                .context(WorkbookSnafu)?;
        }

        let mut row: u32 = 1;
        for batch in batches {
            for batch_row in 0..batch.num_rows() {
                for (col, column) in schema.columns().iter().enumerate() {
                    write_cell(
                        worksheet,
                        row,
                        col as u16,
                        column.column_type,
                        batch,
                        batch_row,
                        col,
                        &datetime_format,
                    )?;
                }
                row += 1;
            }
        }
    }

    workbook.save(path).context(WorkbookSnafu)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn write_cell(
    worksheet: &mut rust_xlsxwriter::Worksheet,
    row: u32,
    col: u16,
    column_type: ColumnType,
    batch: &RecordBatch,
    batch_row: usize,
    batch_col: usize,
    datetime_format: &Format,
) -> ExportResult<()> {
    let array = batch.column(batch_col);
    if array.is_null(batch_row) {
        return Ok(());
    }

    match column_type {
        ColumnType::Integer => {
            let values = array
                .as_any()
                .downcast_ref::<Int64Array>()
                .expect("Int64 array");
            worksheet
                .write_number(row, col, values.value(batch_row) as f64)
                .context(WorkbookSnafu)?;
        }
        ColumnType::Float => {
            let values = array
                .as_any()
                .downcast_ref::<Float64Array>()
                .expect("Float64 array");
            worksheet
                .write_number(row, col, values.value(batch_row))
                .context(WorkbookSnafu)?;
        }
        ColumnType::Boolean => {
            let values = array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .expect("Boolean array");
            worksheet
                .write_boolean(row, col, values.value(batch_row))
                .context(WorkbookSnafu)?;
        }
        ColumnType::DateTime => {
            let values = array
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .expect("Timestamp array");
            if let Some(dt) = DateTime::from_timestamp_micros(values.value(batch_row)) {
                worksheet
                    .write_datetime_with_format(row, col, &dt.naive_utc(), datetime_format)
                    .context(WorkbookSnafu)?;
            }
        }
        ColumnType::Text => {
            let values = array
                .as_any()
                .downcast_ref::<StringArray>()
                .expect("String array");
            worksheet
                .write_string(row, col, values.value(batch_row))
                .context(WorkbookSnafu)?;
        }
    }

    Ok(())
}

/// Clamp a table name into a legal worksheet name.
fn worksheet_name(table_name: &str) -> String {
    let cleaned: String = table_name
        .chars()
        .map(|c| {
            if matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') {
                '_'
            } else {
                c
            }
        })
        .collect();
    cleaned.chars().take(MAX_SHEET_NAME_LEN).collect()
}
