//! Wrapper prelude.
//!
//! The `sheetdb` crate is the supported public entry point. Downstream
//! code should prefer importing from this prelude instead of depending on
//! internal core module paths.

pub use crate::{
    Cell, Column, ColumnType, CsvExportOptions, Database, DatabaseError, DatabaseLocation,
    ExcelExportOptions, SchemaError, Sheet, TableSchema, WidenPolicy, read_tabular_file,
};

#[cfg(feature = "datafusion")]
pub use crate::{QueryError, QueryOutput, run_query, session_for};
