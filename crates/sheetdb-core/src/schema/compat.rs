//! Schema reconciliation for appends.
//!
//! Appended data must cover exactly the target table's column set (order
//! may differ). For each shared column the reconciled type is the least
//! upper bound of the existing and incoming types; whether widening to
//! text is allowed depends on the [`WidenPolicy`]. Column-set mismatches
//! are hard errors: silently dropping or null-filling columns would
//! corrupt query results.

use snafu::prelude::*;

use super::column_type::ColumnType;
use super::table_schema::{Column, TableSchema};

/// How appends treat values that would force a non-text column to text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WidenPolicy {
    /// Take the lattice least upper bound; anything can widen to text.
    #[default]
    Permissive,
    /// Accept only numeric widening (integer to float); reject widening
    /// a non-text column to text.
    Strict,
}

/// Errors raised when appended data is not compatible with the table.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum SchemaCompatibilityError {
    /// The incoming data is missing a column that exists in the table.
    #[snafu(display("Incoming data is missing required column {column}"))]
    MissingColumn {
        /// The name of the missing column.
        column: String,
    },

    /// The incoming data has a column that does not exist in the table.
    #[snafu(display("Incoming data has extra column {column} not present in table schema"))]
    ExtraColumn {
        /// The name of the extra column.
        column: String,
    },

    /// Under the strict policy, the incoming type would force the column
    /// to text.
    #[snafu(display(
        "Incompatible type for column {column}: table has {existing}, incoming data has {incoming}"
    ))]
    IncompatibleType {
        /// The name of the column with the incompatible type.
        column: String,
        /// The registered column type.
        existing: ColumnType,
        /// The inferred type of the incoming data.
        incoming: ColumnType,
    },
}

/// Reconcile an incoming schema against the registered one.
///
/// On success returns the table's new schema: the registered column order
/// and spelling, with each column's type widened to cover both sides.
/// Matching is by name, case-insensitive and order-insensitive.
pub fn reconcile(
    existing: &TableSchema,
    incoming: &TableSchema,
    policy: WidenPolicy,
) -> Result<TableSchema, SchemaCompatibilityError> {
    for col in incoming.columns() {
        if existing.index_of(&col.name).is_none() {
            return ExtraColumnSnafu {
                column: col.name.clone(),
            }
            .fail();
        }
    }

    let mut widened = Vec::with_capacity(existing.columns().len());
    for col in existing.columns() {
        let incoming_type =
            incoming
                .column_type(&col.name)
                .ok_or_else(|| SchemaCompatibilityError::MissingColumn {
                    column: col.name.clone(),
                })?;

        let merged = col.column_type.widen(incoming_type);
        if policy == WidenPolicy::Strict
            && merged == ColumnType::Text
            && col.column_type != ColumnType::Text
        {
            return IncompatibleTypeSnafu {
                column: col.name.clone(),
                existing: col.column_type,
                incoming: incoming_type,
            }
            .fail();
        }
        widened.push(Column::new(col.name.clone(), merged));
    }

    // Invariant: the names are exactly the existing schema's validated
    // names, so revalidation cannot fail.
    Ok(TableSchema::new(widened).expect("reconciled schema reuses validated column names"))
}
