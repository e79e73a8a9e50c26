//! Tabular file readers.
//!
//! [`read_tabular_file`] maps a file path onto one or more [`Sheet`]s:
//! a CSV file yields a single sheet named after the file stem; a workbook
//! yields one sheet per worksheet, named after the worksheet. The format
//! is detected from the file extension.

pub mod csv;
pub mod excel;

use std::path::Path;

use snafu::prelude::*;

use crate::sheet::{Sheet, SheetError};

/// Errors raised while reading tabular files.
#[derive(Debug, Snafu)]
pub enum ReadError {
    /// The file extension does not map to a supported tabular format.
    #[snafu(display("Unsupported tabular format '{extension}' for {path}"))]
    UnsupportedExtension {
        /// The offending path.
        path: String,
        /// The extension that was not recognized.
        extension: String,
    },

    /// The CSV reader failed (I/O or malformed rows).
    #[snafu(display("Failed to read CSV file {path}: {source}"))]
    Csv {
        /// The offending path.
        path: String,
        /// Underlying CSV reader error.
        source: ::csv::Error,
    },

    /// The workbook reader failed (I/O or malformed workbook).
    #[snafu(display("Failed to read workbook {path}: {source}"))]
    Workbook {
        /// The offending path.
        path: String,
        /// Underlying workbook reader error.
        source: calamine::Error,
    },

    /// The file parsed but did not form a valid tabular unit.
    #[snafu(display("Invalid tabular data in {path}: {source}"))]
    Sheet {
        /// The offending path.
        path: String,
        /// Underlying sheet validation error.
        source: SheetError,
    },
}

/// Result alias for reader operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// Read a tabular file into one sheet per tabular unit.
///
/// Supported extensions: `csv` plus the workbook formats the spreadsheet
/// reader handles natively (`xlsx`, `xls`, `xlsm`, `xlsb`, `ods`).
/// Worksheets with no cells are skipped with a warning.
pub fn read_tabular_file(path: &Path) -> ReadResult<Vec<Sheet>> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(vec![csv::read_csv(path)?]),
        "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => excel::read_workbook(path),
        _ => UnsupportedExtensionSnafu {
            path: path.display().to_string(),
            extension,
        }
        .fail(),
    }
}

/// Table name for a file-level tabular unit: the file stem.
pub(crate) fn file_stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "data".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extension_is_rejected() {
        let err = read_tabular_file(Path::new("data.parquet")).expect_err("unsupported");
        assert!(matches!(
            err,
            ReadError::UnsupportedExtension { extension, .. } if extension == "parquet"
        ));
    }

    #[test]
    fn missing_extension_is_rejected() {
        let err = read_tabular_file(Path::new("data")).expect_err("unsupported");
        assert!(matches!(err, ReadError::UnsupportedExtension { .. }));
    }
}
