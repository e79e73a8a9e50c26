//! Table catalog: persisted manifests and the in-memory registry.
//!
//! Each table owns a directory under `tables/` in the database root with a
//! JSON manifest (`table.json`) describing its schema, data segments, and
//! version. The in-memory [`Catalog`] is rebuilt from those manifests
//! every time a database is opened, so the registry and the store cannot
//! silently diverge across sessions.
//!
//! ## On-disk layout (high level)
//!
//! ```text
//! db_root/
//!   tables/
//!     people/
//!       table.json                 # manifest: schema, segments, version
//!       data/
//!         part-00001.parquet       # immutable data segments, in append order
//!         part-00002.parquet
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use crate::schema::TableSchema;
use crate::storage::{self, DatabaseLocation, StorageError};

/// Current manifest format version.
///
/// Bumped only on breaking changes to the on-disk JSON format.
pub const MANIFEST_FORMAT_VERSION: u32 = 1;

/// Directory under the database root that holds one directory per table.
pub const TABLES_DIR_NAME: &str = "tables";

/// Manifest file name inside each table directory.
pub const MANIFEST_FILE_NAME: &str = "table.json";

/// Metadata for one immutable data segment of a table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentMeta {
    /// Segment path relative to the database root.
    pub path: String,
    /// Number of rows stored in the segment.
    pub row_count: u64,
}

/// Persisted description of one table: its schema, data segments, and a
/// monotonically increasing version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableManifest {
    /// Table name in its display spelling.
    pub name: String,
    /// The registered schema; append operations may widen it.
    pub schema: TableSchema,
    /// Data segments in append order.
    pub segments: Vec<SegmentMeta>,
    /// Bumped on every committed mutation. Informational: there is no
    /// multi-writer conflict detection (single-writer model).
    pub version: u64,
    /// Creation timestamp, stored as RFC3339 UTC.
    pub created_at: DateTime<Utc>,
    /// Manifest format version for future evolution.
    pub format_version: u32,
}

impl TableManifest {
    /// Manifest for a freshly created table with no segments yet.
    pub fn new(name: impl Into<String>, schema: TableSchema) -> Self {
        TableManifest {
            name: name.into(),
            schema,
            segments: Vec::new(),
            version: 1,
            created_at: Utc::now(),
            format_version: MANIFEST_FORMAT_VERSION,
        }
    }

    /// Total row count across all segments.
    pub fn row_count(&self) -> u64 {
        self.segments.iter().map(|s| s.row_count).sum()
    }
}

/// The table directory for `table_name`, relative to the database root.
pub fn table_dir(table_name: &str) -> PathBuf {
    Path::new(TABLES_DIR_NAME).join(table_name)
}

/// The manifest path for `table_name`, relative to the database root.
pub fn manifest_path(table_name: &str) -> PathBuf {
    table_dir(table_name).join(MANIFEST_FILE_NAME)
}

/// The segment path for the `index`-th segment (one-based) of a table,
/// relative to the database root.
pub fn segment_path(table_name: &str, index: usize) -> PathBuf {
    table_dir(table_name)
        .join("data")
        .join(format!("part-{index:05}.parquet"))
}

/// Errors raised by catalog operations.
#[derive(Debug, Snafu)]
pub enum CatalogError {
    /// A table with this name (case-insensitively) is already registered.
    #[snafu(display("Table '{table}' already exists"))]
    NameCollision {
        /// The colliding table name.
        table: String,
    },

    /// The named table is not registered.
    #[snafu(display("Unknown table '{table}'"))]
    UnknownTable {
        /// The unknown table name.
        table: String,
    },

    /// A schema update changed the column set instead of widening types.
    #[snafu(display("Schema update for table '{table}' changes its column set"))]
    ColumnSetChanged {
        /// The table whose update was rejected.
        table: String,
    },

    /// A schema update narrowed a column type.
    #[snafu(display(
        "Schema update for table '{table}' is not a widening: column {column} cannot go from {from} to {to}"
    ))]
    InvalidWidening {
        /// The table whose update was rejected.
        table: String,
        /// The offending column.
        column: String,
        /// The registered column type.
        from: crate::schema::ColumnType,
        /// The proposed column type.
        to: crate::schema::ColumnType,
    },

    /// A manifest file exists but is not valid JSON for this format.
    #[snafu(display("Corrupt table manifest at {path}: {source}"))]
    ManifestDecode {
        /// The manifest path.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A manifest could not be serialized (should not happen for valid
    /// manifests).
    #[snafu(display("Failed to encode table manifest: {source}"))]
    ManifestEncode {
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Underlying storage error while reading or writing manifests.
    #[snafu(display("Storage error while accessing catalog: {source}"))]
    Storage {
        /// Underlying storage error.
        #[snafu(backtrace)]
        source: StorageError,
    },
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// In-memory registry of the tables of one open database.
///
/// Keys are case-insensitive; the manifest keeps the display spelling.
#[derive(Debug, Default)]
pub struct Catalog {
    tables: BTreeMap<String, TableManifest>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Catalog::default()
    }

    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    /// Whether a table with this name is registered.
    pub fn has(&self, name: &str) -> bool {
        self.tables.contains_key(&Self::key(name))
    }

    /// Borrow a registered table's manifest.
    pub fn get(&self, name: &str) -> CatalogResult<&TableManifest> {
        self.tables
            .get(&Self::key(name))
            .ok_or_else(|| CatalogError::UnknownTable {
                table: name.to_string(),
            })
    }

    /// Register a new table. A name can be registered only once.
    pub fn register(&mut self, manifest: TableManifest) -> CatalogResult<()> {
        let key = Self::key(&manifest.name);
        if self.tables.contains_key(&key) {
            return NameCollisionSnafu {
                table: manifest.name,
            }
            .fail();
        }
        self.tables.insert(key, manifest);
        Ok(())
    }

    /// Replace a registered table's manifest.
    ///
    /// The new schema must be a valid widening of the stored one: the same
    /// columns in the same order, each type equal to or wider than before.
    pub fn update(&mut self, manifest: TableManifest) -> CatalogResult<()> {
        let key = Self::key(&manifest.name);
        let existing = self
            .tables
            .get(&key)
            .ok_or_else(|| CatalogError::UnknownTable {
                table: manifest.name.clone(),
            })?;

        ensure_widening(&existing.schema, &manifest.schema, &manifest.name)?;
        self.tables.insert(key, manifest);
        Ok(())
    }

    /// Registered table names (display spelling), sorted.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.values().map(|m| m.name.as_str()).collect()
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the catalog has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterate the registered manifests in name order.
    pub fn manifests(&self) -> impl Iterator<Item = &TableManifest> {
        self.tables.values()
    }

    /// Rebuild the catalog from the manifests under a database root.
    ///
    /// Table directories without a manifest are skipped with a warning:
    /// they can be left behind by an operation that failed before its
    /// manifest commit. A manifest that exists but does not decode is an
    /// error, not a skip.
    pub async fn load(location: &DatabaseLocation) -> CatalogResult<Catalog> {
        let mut catalog = Catalog::new();

        let dirs = storage::list_subdirs(location, Path::new(TABLES_DIR_NAME))
            .await
            .context(StorageSnafu)?;

        for dir in dirs {
            let rel = manifest_path(&dir);
            let contents = match storage::read_to_string(location, &rel).await {
                Ok(contents) => contents,
                Err(StorageError::NotFound { .. }) => {
                    warn!(
                        "skipping table directory '{dir}' without a {MANIFEST_FILE_NAME} manifest"
                    );
                    continue;
                }
                Err(e) => return Err(e).context(StorageSnafu),
            };

            let manifest: TableManifest =
                serde_json::from_str(&contents).context(ManifestDecodeSnafu {
                    path: rel.display().to_string(),
                })?;
            catalog.register(manifest)?;
        }

        Ok(catalog)
    }
}

/// Persist a manifest with an atomic replace.
pub async fn write_manifest(
    location: &DatabaseLocation,
    manifest: &TableManifest,
) -> CatalogResult<()> {
    let json = serde_json::to_vec_pretty(manifest).context(ManifestEncodeSnafu)?;
    storage::write_atomic(location, &manifest_path(&manifest.name), &json)
        .await
        .context(StorageSnafu)
}

fn ensure_widening(
    existing: &TableSchema,
    proposed: &TableSchema,
    table: &str,
) -> CatalogResult<()> {
    let same_columns = existing.columns().len() == proposed.columns().len()
        && existing
            .columns()
            .iter()
            .zip(proposed.columns())
            .all(|(a, b)| a.name.eq_ignore_ascii_case(&b.name));
    if !same_columns {
        return ColumnSetChangedSnafu {
            table: table.to_string(),
        }
        .fail();
    }

    for (old, new) in existing.columns().iter().zip(proposed.columns()) {
        if old.column_type.widen(new.column_type) != new.column_type {
            return InvalidWideningSnafu {
                table: table.to_string(),
                column: old.name.clone(),
                from: old.column_type,
                to: new.column_type,
            }
            .fail();
        }
    }

    Ok(())
}
