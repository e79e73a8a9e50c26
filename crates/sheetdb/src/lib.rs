//! # sheetdb
//!
//! Treat a collection of spreadsheet/CSV files as a queryable relational
//! database: load tabular files into tables, append rows to existing
//! tables, run arbitrary SQL, and export tables back to CSV or workbook
//! files.
//!
//! This crate is the supported public entry point and provides a small,
//! stable surface.
//!
//! ## Features
//!
//! - `datafusion` (default): Enables the SQL query facade
//!
//! ## Example
//!
//! ```rust,ignore
//! use sheetdb::prelude::*;
//! ```

/// Convenience prelude with the stable, supported surface.
pub mod prelude;

/// SQL query facade (enabled by default).
#[cfg(feature = "datafusion")]
pub mod query {
    pub use sheetdb_datafusion::*;
}

pub use sheetdb_core::catalog::{TableManifest, SegmentMeta};
pub use sheetdb_core::cell::Cell;
pub use sheetdb_core::database::{Database, DatabaseError};
pub use sheetdb_core::export::{CsvExportOptions, ExcelExportOptions};
pub use sheetdb_core::reader::read_tabular_file;
pub use sheetdb_core::schema::{Column, ColumnType, SchemaError, TableSchema, WidenPolicy};
pub use sheetdb_core::sheet::Sheet;
pub use sheetdb_core::storage::DatabaseLocation;

#[cfg(feature = "datafusion")]
pub use sheetdb_datafusion::{QueryError, QueryOutput, run_query, session_for};
