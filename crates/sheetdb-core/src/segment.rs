//! Segment materialization: cells to Arrow batches to Parquet and back.
//!
//! Rows enter storage by materializing a [`Sheet`] against a
//! [`TableSchema`] into one Arrow `RecordBatch`, serialized as a Parquet
//! segment. Segments are immutable; when a table's schema widens, old
//! segments keep their original physical types and every read aligns
//! them to the current registered schema ([`align_batch`]).

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, BooleanBuilder, Float64Array, Float64Builder, Int64Array,
    Int64Builder, RecordBatch, StringBuilder, TimestampMicrosecondArray,
    TimestampMicrosecondBuilder,
};
use arrow::compute;
use arrow::datatypes::{DataType, SchemaRef};
use arrow::error::ArrowError;
use bytes::Bytes;
use chrono::DateTime;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::errors::ParquetError;
use snafu::prelude::*;

use crate::cell::{Cell, DATETIME_FORMAT, render_float};
use crate::schema::{ColumnType, TableSchema, infer};
use crate::sheet::Sheet;

/// Errors raised while materializing or reading segments.
#[derive(Debug, Snafu)]
pub enum SegmentError {
    /// An Arrow kernel failed (batch construction, casting).
    #[snafu(display("Arrow error: {source}"))]
    Arrow {
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// Parquet serialization or deserialization failed.
    #[snafu(display("Parquet error: {source}"))]
    Parquet {
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// A cell cannot be represented under its column's type.
    ///
    /// Unreachable when the schema was inferred from the same sheet;
    /// guards direct API callers who pass hand-built schemas.
    #[snafu(display(
        "Value '{value}' in row {row} is not a valid {expected} for column {column}"
    ))]
    CellValue {
        /// The column being materialized.
        column: String,
        /// One-based data row number.
        row: usize,
        /// The column's registered type.
        expected: ColumnType,
        /// The offending value, rendered as text.
        value: String,
    },

    /// The sheet has no column matching a schema column.
    #[snafu(display("Sheet '{sheet}' has no column named {column}"))]
    SheetColumnMissing {
        /// The sheet being materialized.
        sheet: String,
        /// The schema column with no source.
        column: String,
    },

    /// A stored segment has no column matching the registered schema.
    #[snafu(display("Stored segment has no column named {column}"))]
    StoredColumnMissing {
        /// The schema column with no source.
        column: String,
    },
}

/// Result alias for segment operations.
pub type SegmentResult<T> = Result<T, SegmentError>;

/// Materialize a sheet into one record batch under `schema`.
///
/// Sheet columns are matched to schema columns by name (case-insensitive),
/// so the sheet's column order may differ from the schema's. Missing cells
/// become nulls.
pub fn batch_from_sheet(schema: &TableSchema, sheet: &Sheet) -> SegmentResult<RecordBatch> {
    let arrow_schema = schema.to_arrow_schema_ref();

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.columns().len());
    for column in schema.columns() {
        let source_idx = sheet
            .header()
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(&column.name))
            .ok_or_else(|| SegmentError::SheetColumnMissing {
                sheet: sheet.name().to_string(),
                column: column.name.clone(),
            })?;

        arrays.push(build_column(
            &column.name,
            column.column_type,
            sheet.column(source_idx),
            sheet.row_count(),
        )?);
    }

    RecordBatch::try_new(arrow_schema, arrays).context(ArrowSnafu)
}

fn build_column<'a>(
    name: &str,
    column_type: ColumnType,
    cells: impl Iterator<Item = &'a Cell>,
    capacity: usize,
) -> SegmentResult<ArrayRef> {
    let bad_cell = |row: usize, cell: &Cell| SegmentError::CellValue {
        column: name.to_string(),
        row: row + 1,
        expected: column_type,
        value: cell.render_text().unwrap_or_default(),
    };

    match column_type {
        ColumnType::Integer => {
            let mut builder = Int64Builder::with_capacity(capacity);
            for (row, cell) in cells.enumerate() {
                let value = match cell {
                    Cell::Missing => None,
                    Cell::Int(v) => Some(*v),
                    Cell::Float(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => {
                        Some(*v as i64)
                    }
                    Cell::Text(s) => Some(infer::parse_int(s).ok_or_else(|| bad_cell(row, cell))?),
                    other => return Err(bad_cell(row, other)),
                };
                builder.append_option(value);
            }
            Ok(Arc::new(builder.finish()))
        }
        ColumnType::Float => {
            let mut builder = Float64Builder::with_capacity(capacity);
            for (row, cell) in cells.enumerate() {
                let value = match cell {
                    Cell::Missing => None,
                    Cell::Int(v) => Some(*v as f64),
                    Cell::Float(v) => Some(*v),
                    Cell::Text(s) => {
                        Some(infer::parse_float(s).ok_or_else(|| bad_cell(row, cell))?)
                    }
                    other => return Err(bad_cell(row, other)),
                };
                builder.append_option(value);
            }
            Ok(Arc::new(builder.finish()))
        }
        ColumnType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(capacity);
            for (row, cell) in cells.enumerate() {
                let value = match cell {
                    Cell::Missing => None,
                    Cell::Bool(v) => Some(*v),
                    Cell::Text(s) => Some(infer::parse_bool(s).ok_or_else(|| bad_cell(row, cell))?),
                    other => return Err(bad_cell(row, other)),
                };
                builder.append_option(value);
            }
            Ok(Arc::new(builder.finish()))
        }
        ColumnType::DateTime => {
            let mut builder = TimestampMicrosecondBuilder::with_capacity(capacity);
            for (row, cell) in cells.enumerate() {
                let value = match cell {
                    Cell::Missing => None,
                    Cell::DateTime(dt) => Some(dt.and_utc().timestamp_micros()),
                    Cell::Text(s) => Some(
                        infer::parse_datetime(s)
                            .ok_or_else(|| bad_cell(row, cell))?
                            .and_utc()
                            .timestamp_micros(),
                    ),
                    other => return Err(bad_cell(row, other)),
                };
                builder.append_option(value);
            }
            Ok(Arc::new(builder.finish()))
        }
        ColumnType::Text => {
            let mut builder = StringBuilder::new();
            for cell in cells {
                builder.append_option(cell.render_text());
            }
            Ok(Arc::new(builder.finish()))
        }
    }
}

/// Serialize one batch into Parquet file bytes.
pub fn write_segment_bytes(batch: &RecordBatch) -> SegmentResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut writer =
        ArrowWriter::try_new(&mut buf, batch.schema(), None).context(ParquetSnafu)?;
    writer.write(batch).context(ParquetSnafu)?;
    writer.close().context(ParquetSnafu)?;
    Ok(buf)
}

/// Read every record batch from Parquet file bytes.
pub fn read_segment_batches(data: Bytes) -> SegmentResult<Vec<RecordBatch>> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)
        .context(ParquetSnafu)?
        .build()
        .context(ParquetSnafu)?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch.context(ArrowSnafu)?);
    }
    Ok(batches)
}

/// Align a stored batch to the current registered schema.
///
/// Columns are matched by name; physical types written before a widening
/// are converted to the registered type (`Int64` to `Float64` via the
/// Arrow cast kernel, anything to `Utf8` via the same deterministic text
/// rendering used at ingestion time).
pub fn align_batch(batch: &RecordBatch, target: &SchemaRef) -> SegmentResult<RecordBatch> {
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(target.fields().len());

    for field in target.fields() {
        let source_idx = batch
            .schema()
            .fields()
            .iter()
            .position(|f| f.name().eq_ignore_ascii_case(field.name()))
            .ok_or_else(|| SegmentError::StoredColumnMissing {
                column: field.name().clone(),
            })?;

        let source = batch.column(source_idx);
        let aligned = if source.data_type() == field.data_type() {
            Arc::clone(source)
        } else if field.data_type() == &DataType::Utf8 {
            render_as_utf8(source)?
        } else {
            compute::cast(source.as_ref(), field.data_type()).context(ArrowSnafu)?
        };
        arrays.push(aligned);
    }

    RecordBatch::try_new(Arc::clone(target), arrays).context(ArrowSnafu)
}

/// Align every batch of a segment to the registered schema.
pub fn align_batches(
    batches: Vec<RecordBatch>,
    target: &SchemaRef,
) -> SegmentResult<Vec<RecordBatch>> {
    batches
        .iter()
        .map(|batch| align_batch(batch, target))
        .collect()
}

/// Text rendering for widened columns, matching [`Cell::render_text`].
fn render_as_utf8(array: &ArrayRef) -> SegmentResult<ArrayRef> {
    let mut builder = StringBuilder::new();

    match array.data_type() {
        DataType::Int64 => {
            let values = array
                .as_any()
                .downcast_ref::<Int64Array>()
                .expect("Int64 array");
            for i in 0..values.len() {
                if values.is_null(i) {
                    builder.append_null();
                } else {
                    builder.append_value(values.value(i).to_string());
                }
            }
        }
        DataType::Float64 => {
            let values = array
                .as_any()
                .downcast_ref::<Float64Array>()
                .expect("Float64 array");
            for i in 0..values.len() {
                if values.is_null(i) {
                    builder.append_null();
                } else {
                    builder.append_value(render_float(values.value(i)));
                }
            }
        }
        DataType::Boolean => {
            let values = array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .expect("Boolean array");
            for i in 0..values.len() {
                if values.is_null(i) {
                    builder.append_null();
                } else {
                    builder.append_value(values.value(i).to_string());
                }
            }
        }
        DataType::Timestamp(_, _) => {
            let values = compute::cast(array.as_ref(), &DataType::Timestamp(
                arrow::datatypes::TimeUnit::Microsecond,
                None,
            ))
            .context(ArrowSnafu)?;
            let values = values
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .expect("Timestamp array");
            for i in 0..values.len() {
                if values.is_null(i) {
                    builder.append_null();
                } else {
                    match DateTime::from_timestamp_micros(values.value(i)) {
                        Some(dt) => builder
                            .append_value(dt.naive_utc().format(DATETIME_FORMAT).to_string()),
                        None => builder.append_null(),
                    }
                }
            }
        }
        // Not produced by this crate's column types; let Arrow decide.
        _ => return compute::cast(array.as_ref(), &DataType::Utf8).context(ArrowSnafu),
    }

    Ok(Arc::new(builder.finish()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use arrow::array::StringArray;
    use chrono::NaiveDate;

    fn schema(cols: &[(&str, ColumnType)]) -> TableSchema {
        TableSchema::new(
            cols.iter()
                .map(|(n, t)| Column::new(*n, *t))
                .collect::<Vec<_>>(),
        )
        .expect("valid schema")
    }

    fn text(v: &str) -> Cell {
        Cell::Text(v.to_string())
    }

    #[test]
    fn materializes_typed_columns_with_nulls() {
        let schema = schema(&[
            ("id", ColumnType::Integer),
            ("amount", ColumnType::Float),
            ("active", ColumnType::Boolean),
            ("joined", ColumnType::DateTime),
            ("note", ColumnType::Text),
        ]);
        let sheet = Sheet::new(
            "t",
            vec![
                "id".to_string(),
                "amount".to_string(),
                "active".to_string(),
                "joined".to_string(),
                "note".to_string(),
            ],
            vec![
                vec![
                    text("1"),
                    text("10"),
                    text("yes"),
                    text("2024-03-01 09:30:00"),
                    text("hello"),
                ],
                vec![
                    Cell::Missing,
                    Cell::Missing,
                    Cell::Missing,
                    Cell::Missing,
                    Cell::Missing,
                ],
            ],
        )
        .expect("rectangular sheet");

        let batch = batch_from_sheet(&schema, &sheet).expect("materialize");
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 5);

        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("int column");
        assert_eq!(ids.value(0), 1);
        assert!(ids.is_null(1));

        let amounts = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("float column");
        assert_eq!(amounts.value(0), 10.0);

        let active = batch
            .column(2)
            .as_any()
            .downcast_ref::<BooleanArray>()
            .expect("bool column");
        assert!(active.value(0));

        let joined = batch
            .column(3)
            .as_any()
            .downcast_ref::<TimestampMicrosecondArray>()
            .expect("timestamp column");
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .expect("valid date")
            .and_hms_opt(9, 30, 0)
            .expect("valid time")
            .and_utc()
            .timestamp_micros();
        assert_eq!(joined.value(0), expected);
    }

    #[test]
    fn matches_sheet_columns_by_name_not_position() {
        let schema = schema(&[("id", ColumnType::Integer), ("name", ColumnType::Text)]);
        let sheet = Sheet::new(
            "t",
            vec!["Name".to_string(), "ID".to_string()],
            vec![vec![text("Alice"), text("1")]],
        )
        .expect("rectangular sheet");

        let batch = batch_from_sheet(&schema, &sheet).expect("materialize");
        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<Int64Array>()
            .expect("int column");
        assert_eq!(ids.value(0), 1);
        let names = batch
            .column(1)
            .as_any()
            .downcast_ref::<StringArray>()
            .expect("string column");
        assert_eq!(names.value(0), "Alice");
    }

    #[test]
    fn sheet_missing_schema_column_errors() {
        let schema = schema(&[("id", ColumnType::Integer)]);
        let sheet = Sheet::new("t", vec!["other".to_string()], vec![]).expect("sheet");

        let err = batch_from_sheet(&schema, &sheet).expect_err("missing column");
        assert!(matches!(err, SegmentError::SheetColumnMissing { .. }));
    }

    #[test]
    fn non_conforming_cell_errors() {
        let schema = schema(&[("id", ColumnType::Integer)]);
        let sheet = Sheet::new("t", vec!["id".to_string()], vec![vec![text("abc")]])
            .expect("sheet");

        let err = batch_from_sheet(&schema, &sheet).expect_err("bad cell");
        assert!(matches!(
            err,
            SegmentError::CellValue {
                row: 1,
                expected: ColumnType::Integer,
                ..
            }
        ));
    }

    #[test]
    fn parquet_roundtrip_preserves_rows() {
        let schema = schema(&[("id", ColumnType::Integer), ("note", ColumnType::Text)]);
        let sheet = Sheet::new(
            "t",
            vec!["id".to_string(), "note".to_string()],
            vec![
                vec![text("1"), text("a")],
                vec![text("2"), Cell::Missing],
            ],
        )
        .expect("sheet");

        let batch = batch_from_sheet(&schema, &sheet).expect("materialize");
        let bytes = write_segment_bytes(&batch).expect("write parquet");
        let back = read_segment_batches(Bytes::from(bytes)).expect("read parquet");

        let total: usize = back.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 2);
        assert_eq!(back[0].schema().field(0).name(), "id");
    }

    #[test]
    fn align_casts_int_segment_to_float_schema() {
        let old = schema(&[("amount", ColumnType::Integer)]);
        let sheet = Sheet::new(
            "t",
            vec!["amount".to_string()],
            vec![vec![text("1")], vec![text("2")]],
        )
        .expect("sheet");
        let batch = batch_from_sheet(&old, &sheet).expect("materialize");

        let widened = schema(&[("amount", ColumnType::Float)]).to_arrow_schema_ref();
        let aligned = align_batch(&batch, &widened).expect("align");

        let values = aligned
            .column(0)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("float column");
        assert_eq!(values.value(0), 1.0);
        assert_eq!(values.value(1), 2.0);
    }

    #[test]
    fn align_renders_widened_text_consistently() {
        let old = schema(&[
            ("n", ColumnType::Float),
            ("flag", ColumnType::Boolean),
            ("ts", ColumnType::DateTime),
        ]);
        let sheet = Sheet::new(
            "t",
            vec!["n".to_string(), "flag".to_string(), "ts".to_string()],
            vec![vec![text("3"), text("true"), text("2024-03-01 09:30:00")]],
        )
        .expect("sheet");
        let batch = batch_from_sheet(&old, &sheet).expect("materialize");

        let widened = schema(&[
            ("n", ColumnType::Text),
            ("flag", ColumnType::Text),
            ("ts", ColumnType::Text),
        ])
        .to_arrow_schema_ref();
        let aligned = align_batch(&batch, &widened).expect("align");

        let col = |i: usize| {
            aligned
                .column(i)
                .as_any()
                .downcast_ref::<StringArray>()
                .expect("string column")
                .value(0)
                .to_string()
        };
        assert_eq!(col(0), "3.0");
        assert_eq!(col(1), "true");
        assert_eq!(col(2), "2024-03-01 09:30:00");
    }

    #[test]
    fn align_preserves_nulls() {
        let old = schema(&[("amount", ColumnType::Integer)]);
        let sheet = Sheet::new("t", vec!["amount".to_string()], vec![vec![Cell::Missing]])
            .expect("sheet");
        let batch = batch_from_sheet(&old, &sheet).expect("materialize");

        let as_text = schema(&[("amount", ColumnType::Text)]).to_arrow_schema_ref();
        let aligned = align_batch(&batch, &as_text).expect("align");
        assert!(aligned.column(0).is_null(0));
    }
}
