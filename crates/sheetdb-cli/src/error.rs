use std::io;

use sheetdb_core::database::DatabaseError;
use sheetdb_datafusion::QueryError;
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display(
        "Failed to open database at {db}. \
         Ensure the directory is writable and its manifests are intact."
    ))]
    OpenDatabase {
        db: String,
        #[snafu(source(from(DatabaseError, Box::new)))]
        source: Box<DatabaseError>,
    },

    #[snafu(display("Failed to add data to database {db}"))]
    AddData {
        db: String,
        #[snafu(source(from(DatabaseError, Box::new)))]
        source: Box<DatabaseError>,
    },

    #[snafu(display("Failed to append data to table {table}"))]
    AppendData {
        table: String,
        #[snafu(source(from(DatabaseError, Box::new)))]
        source: Box<DatabaseError>,
    },

    #[snafu(display("Failed to export from database {db}"))]
    ExportData {
        db: String,
        #[snafu(source(from(DatabaseError, Box::new)))]
        source: Box<DatabaseError>,
    },

    #[snafu(display("Failed to inspect table {table}"))]
    InspectTable {
        table: String,
        #[snafu(source(from(DatabaseError, Box::new)))]
        source: Box<DatabaseError>,
    },

    #[snafu(transparent)]
    Query { source: QueryError },

    #[snafu(display("Failed to format query results: {source}"))]
    Render { source: arrow::error::ArrowError },

    #[snafu(display("Failed to write query output to {path}: {source}"))]
    OutputIo { path: String, source: io::Error },

    #[snafu(display("Failed to write query output to {path}: {source}"))]
    OutputWrite {
        path: String,
        source: arrow::error::ArrowError,
    },
}
