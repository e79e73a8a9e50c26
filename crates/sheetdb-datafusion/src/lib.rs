//! DataFusion integration for `sheetdb-core`.
//!
//! This crate intentionally keeps all DataFusion types out of
//! `sheetdb-core`. The entry points are [`session_for`], which registers
//! every table of an open database into a SQL session, and [`run_query`],
//! which passes SQL text to the engine unmodified and returns whatever
//! rows and columns the engine produces.

use std::sync::Arc;

use arrow::array::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::error::DataFusionError;
use datafusion::prelude::SessionContext;
use sheetdb_core::database::{Database, DatabaseError};
use snafu::prelude::*;

/// Errors surfaced by the query facade.
#[derive(Debug, Snafu)]
pub enum QueryError {
    /// The SQL engine rejected the statement or failed during execution.
    /// Propagated unchanged; this crate performs no validation of its own.
    #[snafu(display("Query failed: {source}"))]
    Engine {
        /// Underlying engine error.
        source: DataFusionError,
    },

    /// Reading table contents out of the database failed.
    #[snafu(display("Failed to load table data: {source}"))]
    Database {
        /// Underlying database error.
        source: DatabaseError,
    },
}

/// Result alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// The outcome of one SQL statement: column names and rows exactly as the
/// engine reported them.
#[derive(Debug, Clone)]
pub struct QueryOutput {
    /// Column names in engine order.
    pub columns: Vec<String>,
    /// Result batches in engine order.
    pub batches: Vec<RecordBatch>,
}

impl QueryOutput {
    /// Total number of result rows.
    pub fn row_count(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }
}

/// Build a SQL session with every table of `db` registered.
///
/// Tables are registered under the lowercased table name (SQL identifiers
/// are case-insensitive unless quoted). Each table's rows are loaded
/// aligned to its registered schema, as a single partition so stored row
/// order is preserved.
pub async fn session_for(db: &Database) -> QueryResult<SessionContext> {
    let ctx = SessionContext::new();

    for name in db.table_names() {
        let schema = db.schema_of(name).context(DatabaseSnafu)?;
        let batches = db.read_table(name).await.context(DatabaseSnafu)?;

        let table =
            MemTable::try_new(schema.to_arrow_schema_ref(), vec![batches]).context(EngineSnafu)?;
        ctx.register_table(name.to_lowercase().as_str(), Arc::new(table))
            .context(EngineSnafu)?;
    }

    Ok(ctx)
}

/// Run one SQL statement against an already-built session.
pub async fn run_query_in(ctx: &SessionContext, sql: &str) -> QueryResult<QueryOutput> {
    let df = ctx.sql(sql).await.context(EngineSnafu)?;
    let columns: Vec<String> = df
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let batches = df.collect().await.context(EngineSnafu)?;

    Ok(QueryOutput { columns, batches })
}

/// Run one SQL statement against `db`, building a fresh session.
pub async fn run_query(db: &Database, sql: &str) -> QueryResult<QueryOutput> {
    let ctx = session_for(db).await?;
    run_query_in(&ctx, sql).await
}
