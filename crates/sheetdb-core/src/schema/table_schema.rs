//! Table schema definitions and name validation.

use std::{fmt, sync::Arc};

use arrow::datatypes::{Field, Schema, SchemaRef};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use super::column_type::ColumnType;

/// A named, typed column of a table schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    /// Column name as it appeared in the source header (trimmed).
    pub name: String,
    /// Inferred logical type.
    pub column_type: ColumnType,
}

impl Column {
    /// Convenience constructor.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Column {
            name: name.into(),
            column_type,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.column_type)
    }
}

/// Errors raised while validating column or table names.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum SchemaError {
    /// Two header cells normalize to the same column name.
    #[snafu(display("Duplicate column name: {column}"))]
    DuplicateColumn {
        /// The duplicate column name (lowercased form).
        column: String,
    },

    /// A header cell is blank after trimming.
    #[snafu(display("Empty column name at position {position}"))]
    EmptyColumnName {
        /// Zero-based header position of the blank cell.
        position: usize,
    },

    /// A schema must describe at least one column.
    #[snafu(display("Schema has no columns"))]
    EmptySchema,

    /// The table name is blank or cannot be used as a storage directory.
    #[snafu(display("Invalid table name '{name}': {reason}"))]
    InvalidTableName {
        /// The offending name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// An ordered sequence of named, typed columns.
///
/// Order is significant: it matches the source header and determines
/// export column order. Names are unique case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableSchema {
    columns: Vec<Column>,
}

impl TableSchema {
    /// Construct a validated schema.
    ///
    /// Trims column names, rejects blank names, and rejects duplicates
    /// (detection is case-insensitive; the original spelling is kept).
    pub fn new(columns: Vec<Column>) -> Result<Self, SchemaError> {
        if columns.is_empty() {
            return EmptySchemaSnafu.fail();
        }

        let mut seen = std::collections::HashSet::with_capacity(columns.len());
        let mut out = Vec::with_capacity(columns.len());
        for (position, mut col) in columns.into_iter().enumerate() {
            col.name = col.name.trim().to_string();
            if col.name.is_empty() {
                return EmptyColumnNameSnafu { position }.fail();
            }
            if !seen.insert(col.name.to_lowercase()) {
                return DuplicateColumnSnafu {
                    column: col.name.to_lowercase(),
                }
                .fail();
            }
            out.push(col);
        }

        Ok(TableSchema { columns: out })
    }

    /// Borrow the columns in schema order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in schema order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Case-insensitive position lookup.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Case-insensitive type lookup.
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.index_of(name).map(|i| self.columns[i].column_type)
    }

    /// Convert to an owned Arrow [`Schema`].
    ///
    /// Every column is nullable: blank cells are stored as nulls.
    pub fn to_arrow_schema(&self) -> Schema {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name.clone(), c.column_type.to_arrow(), true))
            .collect();
        Schema::new(fields)
    }

    /// Convert to a shared Arrow [`SchemaRef`].
    pub fn to_arrow_schema_ref(&self) -> SchemaRef {
        Arc::new(self.to_arrow_schema())
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, col) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{col}")?;
        }
        Ok(())
    }
}

/// Normalize and validate a table name.
///
/// Trims whitespace and rejects names that are blank or unusable as a
/// storage directory component. Uniqueness against other tables is checked
/// case-insensitively by the catalog, not here.
pub fn normalize_table_name(raw: &str) -> Result<String, SchemaError> {
    let name = raw.trim();
    if name.is_empty() {
        return InvalidTableNameSnafu {
            name: raw.to_string(),
            reason: "name is empty".to_string(),
        }
        .fail();
    }
    if name == "." || name == ".." {
        return InvalidTableNameSnafu {
            name: name.to_string(),
            reason: "name is a relative path component".to_string(),
        }
        .fail();
    }
    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        return InvalidTableNameSnafu {
            name: name.to_string(),
            reason: "name contains a path separator".to_string(),
        }
        .fail();
    }
    Ok(name.to_string())
}
