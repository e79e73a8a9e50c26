//! CSV ingestion.
//!
//! CSV cells carry no type information, so every non-blank cell becomes
//! [`Cell::Text`] and the lexical type is discovered during inference.

use std::path::Path;

use snafu::prelude::*;

use crate::cell::Cell;
use crate::sheet::Sheet;

use super::{CsvSnafu, ReadResult, SheetSnafu, file_stem_name};

/// Read one CSV file into a sheet named after the file stem.
pub fn read_csv(path: &Path) -> ReadResult<Sheet> {
    let path_str = path.display().to_string();

    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(CsvSnafu {
            path: path_str.clone(),
        })?;

    let header: Vec<String> = reader
        .headers()
        .context(CsvSnafu {
            path: path_str.clone(),
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context(CsvSnafu {
            path: path_str.clone(),
        })?;
        rows.push(record.iter().map(cell_from_field).collect());
    }

    Sheet::new(file_stem_name(path), header, rows).context(SheetSnafu { path: path_str })
}

fn cell_from_field(field: &str) -> Cell {
    if field.is_empty() {
        Cell::Missing
    } else {
        Cell::Text(field.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ReadError;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).expect("write test csv");
        path
    }

    #[test]
    fn reads_header_and_rows() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_csv(&tmp, "people.csv", "id,name\n1,Alice\n2,\n");

        let sheet = read_csv(&path).expect("read csv");
        assert_eq!(sheet.name(), "people");
        assert_eq!(sheet.header(), ["id", "name"]);
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(
            sheet.rows()[0],
            vec![
                Cell::Text("1".to_string()),
                Cell::Text("Alice".to_string())
            ]
        );
        assert_eq!(sheet.rows()[1][1], Cell::Missing);
    }

    #[test]
    fn ragged_rows_error() {
        let tmp = TempDir::new().expect("tempdir");
        let path = write_csv(&tmp, "bad.csv", "a,b\n1\n");

        let err = read_csv(&path).expect_err("ragged row");
        assert!(matches!(err, ReadError::Csv { .. }));
    }

    #[test]
    fn missing_file_errors() {
        let err = read_csv(Path::new("/nonexistent/x.csv")).expect_err("missing file");
        assert!(matches!(err, ReadError::Csv { .. }));
    }
}
