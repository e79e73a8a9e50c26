//! Workbook ingestion.
//!
//! Workbook cells arrive typed from the reader (numbers, booleans,
//! datetimes), so they map directly onto [`Cell`] variants. The first row
//! of each worksheet's used range is the header row.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use log::warn;
use snafu::prelude::*;

use crate::cell::Cell;
use crate::schema::infer;
use crate::sheet::Sheet;

use super::{ReadResult, SheetSnafu, WorkbookSnafu};

/// Read every non-empty worksheet of a workbook into its own sheet.
pub fn read_workbook(path: &Path) -> ReadResult<Vec<Sheet>> {
    let path_str = path.display().to_string();

    let mut workbook = open_workbook_auto(path).context(WorkbookSnafu {
        path: path_str.clone(),
    })?;

    let names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name).context(WorkbookSnafu {
            path: path_str.clone(),
        })?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            warn!("skipping empty worksheet '{name}' in {path_str}");
            continue;
        };

        let header: Vec<String> = header_row.iter().map(header_text).collect();
        let data: Vec<Vec<Cell>> = rows
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();

        sheets.push(Sheet::new(name, header, data).context(SheetSnafu {
            path: path_str.clone(),
        })?);
    }

    Ok(sheets)
}

fn header_text(data: &Data) -> String {
    match data {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Missing,
        Data::String(s) => {
            if s.is_empty() {
                Cell::Missing
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Int(v) => Cell::Int(*v),
        Data::Float(v) => Cell::Float(*v),
        Data::Bool(v) => Cell::Bool(*v),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Cell::DateTime(naive),
            // Out-of-range serial values keep their raw number.
            None => Cell::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match infer::parse_datetime(s) {
            Some(naive) => Cell::DateTime(naive),
            None => Cell::Text(s.clone()),
        },
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Missing,
    }
}
