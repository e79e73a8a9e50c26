//! Database instance: open/close lifecycle and the ingestion pipeline.
//!
//! This module contains the add/append implementations plus the export
//! dispatchers. It is responsible for:
//! - validating table names and schemas for every unit before the first
//!   write (an operation is all-or-nothing),
//! - enforcing add vs append semantics (add never overwrites, append
//!   never creates),
//! - reconciling appended data against the registered schema and
//!   recording widenings,
//! - committing each table mutation by atomically replacing its manifest.
//!   Keep new ingestion-time invariants here so the flow stays centralized.

use std::path::{Path, PathBuf};

use arrow::array::RecordBatch;
use bytes::Bytes;
use snafu::prelude::*;

use crate::catalog::{self, Catalog, CatalogError, SegmentMeta, TableManifest};
use crate::export::{self, CsvExportOptions, ExcelExportOptions, ExportError};
use crate::reader::{self, ReadError};
use crate::schema::{
    SchemaCompatibilityError, SchemaError, TableSchema, WidenPolicy, normalize_table_name,
    reconcile,
};
use crate::segment::{self, SegmentError};
use crate::sheet::Sheet;
use crate::storage::{self, DatabaseLocation, StorageError};

/// Errors surfaced by database operations.
#[derive(Debug, Snafu)]
pub enum DatabaseError {
    /// Column or table name validation failed.
    #[snafu(display("Schema error: {source}"))]
    Schema {
        /// Underlying schema validation error.
        source: SchemaError,
    },

    /// A tabular file could not be read.
    #[snafu(display("Read error: {source}"))]
    Read {
        /// Underlying reader error.
        source: ReadError,
    },

    /// Add targets a table name that already exists.
    #[snafu(display("Table '{table}' already exists; add never overwrites"))]
    NameCollision {
        /// The colliding table name.
        table: String,
    },

    /// Append, export, or introspection targets a table that is not
    /// registered.
    #[snafu(display("Unknown table '{table}'"))]
    UnknownTable {
        /// The unknown table name.
        table: String,
    },

    /// Appended data is not compatible with the target table's schema.
    #[snafu(display("Appended data does not match table '{table}': {source}"))]
    SchemaMismatch {
        /// The append target.
        table: String,
        /// Underlying compatibility error.
        source: SchemaCompatibilityError,
    },

    /// An append source file holds several sheets and none matches the
    /// target table.
    #[snafu(display(
        "File {path} holds multiple sheets and none is named '{table}'; cannot pick an append source"
    ))]
    AmbiguousSource {
        /// The source file.
        path: String,
        /// The append target.
        table: String,
    },

    /// Catalog state violation (corrupt manifest, invalid widening).
    #[snafu(display("Catalog error: {source}"))]
    Catalog {
        /// Underlying catalog error.
        source: CatalogError,
    },

    /// Underlying storage failure.
    #[snafu(display("Storage error: {source}"))]
    Storage {
        /// Underlying storage error.
        #[snafu(backtrace)]
        source: StorageError,
    },

    /// Segment materialization or decoding failure.
    #[snafu(display("Segment error: {source}"))]
    Segment {
        /// Underlying segment error.
        source: SegmentError,
    },

    /// The export target extension maps to no supported format.
    #[snafu(display("Unsupported export format '{extension}' for {path}"))]
    ExportFormat {
        /// The target path.
        path: String,
        /// The unrecognized extension.
        extension: String,
    },

    /// Writing an export file failed.
    #[snafu(display("Export error: {source}"))]
    Export {
        /// Underlying export writer error.
        source: ExportError,
    },
}

/// Result alias for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// An open sheetdb database: a storage root plus the catalog of its
/// tables.
///
/// The database instance exclusively owns the catalog and the storage
/// handle; one writer per database instance, no internal locking.
/// Concurrent external processes on the same root must coordinate
/// themselves.
#[derive(Debug)]
pub struct Database {
    location: DatabaseLocation,
    catalog: Catalog,
}

impl Database {
    /// Open a database at `location`, creating the root directory when it
    /// does not exist yet.
    ///
    /// The catalog is rebuilt from the manifests on disk, never trusted
    /// from a previous session.
    pub async fn open(location: DatabaseLocation) -> DatabaseResult<Self> {
        storage::create_root(&location).await.context(StorageSnafu)?;
        let catalog = Catalog::load(&location).await.context(CatalogSnafu)?;
        Ok(Database { location, catalog })
    }

    /// Open a database and immediately ingest the given tabular files.
    pub async fn open_with_sources(
        location: DatabaseLocation,
        sources: &[PathBuf],
    ) -> DatabaseResult<Self> {
        let mut db = Self::open(location).await?;

        let mut sheets = Vec::new();
        for path in sources {
            sheets.extend(reader::read_tabular_file(path).context(ReadSnafu)?);
        }
        db.add_sheets(sheets).await?;

        Ok(db)
    }

    /// The database's storage location.
    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    /// The database name: the root directory's file name.
    pub fn name(&self) -> String {
        self.location
            .root()
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "db".to_string())
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        self.catalog.table_names()
    }

    /// The registered schema of a table.
    pub fn schema_of(&self, table: &str) -> DatabaseResult<&TableSchema> {
        Ok(&self.manifest(table)?.schema)
    }

    /// Total stored row count of a table.
    pub fn row_count(&self, table: &str) -> DatabaseResult<u64> {
        Ok(self.manifest(table)?.row_count())
    }

    fn manifest(&self, table: &str) -> DatabaseResult<&TableManifest> {
        self.catalog.get(table).map_err(|source| match source {
            CatalogError::UnknownTable { table } => DatabaseError::UnknownTable { table },
            other => DatabaseError::Catalog { source: other },
        })
    }

    // ── Add ────────────────────────────────────────────────────────────

    /// Ingest every tabular unit of the given files as new tables.
    ///
    /// Returns the created table names in ingestion order.
    pub async fn add_files(
        &mut self,
        paths: &[impl AsRef<Path>],
    ) -> DatabaseResult<Vec<String>> {
        let mut sheets = Vec::new();
        for path in paths {
            sheets.extend(reader::read_tabular_file(path.as_ref()).context(ReadSnafu)?);
        }
        self.add_sheets(sheets).await
    }

    /// Ingest one file ([`Database::add_files`] with a single path).
    pub async fn add_file(&mut self, path: impl AsRef<Path>) -> DatabaseResult<Vec<String>> {
        self.add_files(&[path.as_ref()]).await
    }

    /// Ingest pre-parsed tabular units as new tables.
    ///
    /// Every unit is validated (name normalization, collision against
    /// the catalog and within the batch, schema inference, cell
    /// conformance) before anything is written.
    pub async fn add_sheets(&mut self, sheets: Vec<Sheet>) -> DatabaseResult<Vec<String>> {
        // Phase 1: validate and materialize everything up front.
        let mut staged: Vec<(String, TableSchema, RecordBatch)> = Vec::with_capacity(sheets.len());
        let mut batch_names = std::collections::HashSet::new();
        for sheet in &sheets {
            let name = normalize_table_name(sheet.name()).context(SchemaSnafu)?;
            if self.catalog.has(&name) || !batch_names.insert(name.to_lowercase()) {
                return NameCollisionSnafu { table: name }.fail();
            }
            let schema = TableSchema::infer(sheet).context(SchemaSnafu)?;
            let batch = segment::batch_from_sheet(&schema, sheet).context(SegmentSnafu)?;
            staged.push((name, schema, batch));
        }

        // Phase 2: persist. Data file first, manifest as the commit point.
        let mut created = Vec::with_capacity(staged.len());
        for (name, schema, batch) in staged {
            let bytes = segment::write_segment_bytes(&batch).context(SegmentSnafu)?;
            let (rel, _) = self.write_fresh_segment(&name, 1, &bytes).await?;

            let mut manifest = TableManifest::new(&name, schema);
            manifest.segments.push(SegmentMeta {
                path: rel.to_string_lossy().to_string(),
                row_count: batch.num_rows() as u64,
            });

            catalog::write_manifest(&self.location, &manifest)
                .await
                .context(CatalogSnafu)?;
            self.catalog.register(manifest).map_err(map_catalog_error)?;
            created.push(name);
        }

        Ok(created)
    }

    // ── Append ─────────────────────────────────────────────────────────

    /// Append a file's rows to an existing table under the default
    /// (permissive) widening policy.
    ///
    /// If the file holds several sheets, the one named like the target
    /// table is used.
    pub async fn append_file(
        &mut self,
        table: &str,
        path: impl AsRef<Path>,
    ) -> DatabaseResult<u64> {
        self.append_file_with_policy(table, path, WidenPolicy::default())
            .await
    }

    /// [`Database::append_file`] with an explicit widening policy.
    pub async fn append_file_with_policy(
        &mut self,
        table: &str,
        path: impl AsRef<Path>,
        policy: WidenPolicy,
    ) -> DatabaseResult<u64> {
        let path = path.as_ref();
        let mut sheets = reader::read_tabular_file(path).context(ReadSnafu)?;

        let sheet = if sheets.len() == 1 {
            sheets.remove(0)
        } else {
            let idx = sheets
                .iter()
                .position(|s| s.name().eq_ignore_ascii_case(table))
                .ok_or_else(|| DatabaseError::AmbiguousSource {
                    path: path.display().to_string(),
                    table: table.to_string(),
                })?;
            sheets.swap_remove(idx)
        };

        self.append_sheet_with_policy(table, sheet, policy).await
    }

    /// Append a pre-parsed tabular unit under the default (permissive)
    /// widening policy. Returns the number of appended rows.
    pub async fn append_sheet(&mut self, table: &str, sheet: Sheet) -> DatabaseResult<u64> {
        self.append_sheet_with_policy(table, sheet, WidenPolicy::default())
            .await
    }

    /// Append a pre-parsed tabular unit to a registered table.
    ///
    /// The incoming column set must match the registered one (order may
    /// differ); shared columns reconcile through the widening lattice
    /// under `policy`. On success the rows are stored as a new segment in
    /// file order and the registered schema is replaced by the widened
    /// one. Existing segments are not rewritten.
    pub async fn append_sheet_with_policy(
        &mut self,
        table: &str,
        sheet: Sheet,
        policy: WidenPolicy,
    ) -> DatabaseResult<u64> {
        let manifest = self.manifest(table)?.clone();

        let incoming = TableSchema::infer(&sheet).context(SchemaSnafu)?;
        let widened = reconcile(&manifest.schema, &incoming, policy).context(SchemaMismatchSnafu {
            table: manifest.name.clone(),
        })?;

        let batch = segment::batch_from_sheet(&widened, &sheet).context(SegmentSnafu)?;
        let bytes = segment::write_segment_bytes(&batch).context(SegmentSnafu)?;
        let (rel, _) = self
            .write_fresh_segment(&manifest.name, manifest.segments.len() + 1, &bytes)
            .await?;

        let mut updated = manifest;
        updated.schema = widened;
        updated.version += 1;
        updated.segments.push(SegmentMeta {
            path: rel.to_string_lossy().to_string(),
            row_count: batch.num_rows() as u64,
        });

        catalog::write_manifest(&self.location, &updated)
            .await
            .context(CatalogSnafu)?;
        self.catalog.update(updated).map_err(map_catalog_error)?;

        Ok(batch.num_rows() as u64)
    }

    /// Write a segment at the first free index at or after `start`.
    ///
    /// Orphan data files from an operation that failed before its
    /// manifest commit may occupy the next index; they are simply skipped
    /// over, never overwritten.
    async fn write_fresh_segment(
        &self,
        table: &str,
        start: usize,
        bytes: &[u8],
    ) -> DatabaseResult<(PathBuf, usize)> {
        let mut index = start;
        loop {
            let rel = catalog::segment_path(table, index);
            match storage::write_new(&self.location, &rel, bytes).await {
                Ok(()) => return Ok((rel, index)),
                Err(StorageError::AlreadyExists { .. }) => index += 1,
                Err(e) => return Err(e).context(StorageSnafu),
            }
        }
    }

    // ── Reads and export ───────────────────────────────────────────────

    /// Read a table's full contents, aligned to its registered schema.
    pub async fn read_table(&self, table: &str) -> DatabaseResult<Vec<RecordBatch>> {
        let manifest = self.manifest(table)?;
        let arrow_schema = manifest.schema.to_arrow_schema_ref();

        let mut batches = Vec::new();
        for seg in &manifest.segments {
            let bytes = storage::read_all_bytes(&self.location, Path::new(&seg.path))
                .await
                .context(StorageSnafu)?;
            let raw = segment::read_segment_batches(Bytes::from(bytes)).context(SegmentSnafu)?;
            batches.extend(segment::align_batches(raw, &arrow_schema).context(SegmentSnafu)?);
        }

        Ok(batches)
    }

    /// Export one table to the file format implied by the target
    /// extension (`.csv` or `.xlsx`).
    pub async fn export_table(&self, table: &str, path: impl AsRef<Path>) -> DatabaseResult<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => {
                let batches = self.read_table(table).await?;
                export::write_csv_file(path, &batches).context(ExportSnafu)
            }
            "xlsx" => {
                let manifest = self.manifest(table)?;
                let batches = self.read_table(table).await?;
                export::write_excel_file(
                    path,
                    &[(manifest.name.clone(), manifest.schema.clone(), batches)],
                )
                .context(ExportSnafu)
            }
            _ => ExportFormatSnafu {
                path: path.display().to_string(),
                extension,
            }
            .fail(),
        }
    }

    /// Export every table to one CSV file per table under `dir`.
    ///
    /// Returns the written file paths in table-name order.
    pub async fn export_all_csv(
        &self,
        dir: impl AsRef<Path>,
        opts: &CsvExportOptions,
    ) -> DatabaseResult<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| DatabaseError::Export {
            source: ExportError::Io {
                path: dir.display().to_string(),
                source,
            },
        })?;

        let prefix = if opts.include_db_name {
            format!("{}_", self.name())
        } else {
            String::new()
        };

        let mut written = Vec::new();
        for manifest in self.catalog.manifests() {
            if is_excluded(&opts.exclude, &manifest.name) {
                continue;
            }
            let batches = self.read_table(&manifest.name).await?;
            let path = dir.join(format!("{prefix}{}.csv", manifest.name));
            export::write_csv_file(&path, &batches).context(ExportSnafu)?;
            written.push(path);
        }

        Ok(written)
    }

    /// Export every table as one worksheet of a single workbook.
    pub async fn export_all_excel(
        &self,
        path: impl AsRef<Path>,
        opts: &ExcelExportOptions,
    ) -> DatabaseResult<()> {
        let mut tables = Vec::new();
        for manifest in self.catalog.manifests() {
            if is_excluded(&opts.exclude, &manifest.name) {
                continue;
            }
            let batches = self.read_table(&manifest.name).await?;
            tables.push((manifest.name.clone(), manifest.schema.clone(), batches));
        }

        export::write_excel_file(path.as_ref(), &tables).context(ExportSnafu)
    }

    /// Delete the database's storage and consume the instance.
    pub async fn destroy(self) -> DatabaseResult<()> {
        storage::remove_root(&self.location)
            .await
            .context(StorageSnafu)
    }
}

fn map_catalog_error(source: CatalogError) -> DatabaseError {
    match source {
        CatalogError::NameCollision { table } => DatabaseError::NameCollision { table },
        CatalogError::UnknownTable { table } => DatabaseError::UnknownTable { table },
        other => DatabaseError::Catalog { source: other },
    }
}

fn is_excluded(exclude: &[String], name: &str) -> bool {
    exclude.iter().any(|e| e.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::schema::ColumnType;
    use tempfile::TempDir;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn text(v: &str) -> Cell {
        Cell::Text(v.to_string())
    }

    fn sheet(name: &str, header: &[&str], rows: &[&[&str]]) -> Sheet {
        Sheet::new(
            name,
            header.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|v| {
                            if v.is_empty() {
                                Cell::Missing
                            } else {
                                text(v)
                            }
                        })
                        .collect()
                })
                .collect(),
        )
        .expect("rectangular sheet")
    }

    async fn open_db(tmp: &TempDir) -> DatabaseResult<Database> {
        Database::open(DatabaseLocation::local(tmp.path().join("db"))).await
    }

    #[tokio::test]
    async fn add_registers_table_with_inferred_schema() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;

        let created = db
            .add_sheets(vec![sheet(
                "trades",
                &["id", "amount"],
                &[&["1", "10"], &["2", "20.5"]],
            )])
            .await?;
        assert_eq!(created, vec!["trades"]);

        let schema = db.schema_of("trades")?;
        assert_eq!(schema.column_type("id"), Some(ColumnType::Integer));
        assert_eq!(schema.column_type("amount"), Some(ColumnType::Float));
        assert_eq!(db.row_count("trades")?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn add_under_an_explicit_table_name() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;

        let unit = sheet("Sheet1", &["a"], &[&["1"]]).with_name("renamed");
        let created = db.add_sheets(vec![unit]).await?;
        assert_eq!(created, vec!["renamed"]);
        Ok(())
    }

    #[tokio::test]
    async fn add_rejects_existing_table_name() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;

        db.add_sheets(vec![sheet("t", &["a"], &[&["1"]])]).await?;
        let err = db
            .add_sheets(vec![sheet("T", &["a"], &[&["2"]])])
            .await
            .expect_err("collision should fail");

        assert!(matches!(err, DatabaseError::NameCollision { table } if table == "T"));
        assert_eq!(db.row_count("t")?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn add_validates_all_units_before_writing_any() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;

        // Second unit collides with the first; nothing must be created.
        let err = db
            .add_sheets(vec![
                sheet("a", &["x"], &[&["1"]]),
                sheet("A", &["x"], &[&["2"]]),
            ])
            .await
            .expect_err("batch-internal collision");

        assert!(matches!(err, DatabaseError::NameCollision { .. }));
        assert!(db.table_names().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn append_to_unknown_table_fails_without_creating_it() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;

        let err = db
            .append_sheet("nope", sheet("nope", &["a"], &[&["1"]]))
            .await
            .expect_err("unknown table");

        assert!(matches!(err, DatabaseError::UnknownTable { table } if table == "nope"));
        assert!(db.table_names().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn append_mismatched_columns_leaves_row_count_unchanged() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;

        db.add_sheets(vec![sheet("t", &["id", "amount"], &[&["1", "10"]])])
            .await?;
        let err = db
            .append_sheet("t", sheet("t", &["id", "other"], &[&["2", "x"]]))
            .await
            .expect_err("column set mismatch");

        assert!(matches!(err, DatabaseError::SchemaMismatch { .. }));
        assert_eq!(db.row_count("t")?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn append_widens_integer_column_to_float() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;

        db.add_sheets(vec![sheet("t", &["id", "amount"], &[&["1", "10"]])])
            .await?;
        assert_eq!(
            db.schema_of("t")?.column_type("amount"),
            Some(ColumnType::Integer)
        );

        let appended = db
            .append_sheet("t", sheet("t", &["id", "amount"], &[&["2", "20.5"]]))
            .await?;
        assert_eq!(appended, 1);
        assert_eq!(
            db.schema_of("t")?.column_type("amount"),
            Some(ColumnType::Float)
        );
        assert_eq!(db.row_count("t")?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn append_policy_branches_on_text_widening() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;

        db.add_sheets(vec![sheet("t", &["id", "amount"], &[&["1", "10"]])])
            .await?;

        // Strict: a text value cannot enter a numeric column.
        let err = db
            .append_sheet_with_policy(
                "t",
                sheet("t", &["id", "amount"], &[&["3", "abc"]]),
                WidenPolicy::Strict,
            )
            .await
            .expect_err("strict policy rejects text widening");
        assert!(matches!(
            err,
            DatabaseError::SchemaMismatch {
                source: SchemaCompatibilityError::IncompatibleType { .. },
                ..
            }
        ));
        assert_eq!(db.row_count("t")?, 1);

        // Permissive: the same append widens the column to text.
        db.append_sheet_with_policy(
            "t",
            sheet("t", &["id", "amount"], &[&["3", "abc"]]),
            WidenPolicy::Permissive,
        )
        .await?;
        assert_eq!(
            db.schema_of("t")?.column_type("amount"),
            Some(ColumnType::Text)
        );
        assert_eq!(db.row_count("t")?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn append_reorders_incoming_columns() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;

        db.add_sheets(vec![sheet("t", &["id", "name"], &[&["1", "Alice"]])])
            .await?;
        db.append_sheet("t", sheet("t", &["name", "id"], &[&["Bob", "2"]]))
            .await?;

        let names: Vec<_> = db.schema_of("t")?.names().map(String::from).collect();
        assert_eq!(names, vec!["id", "name"]);

        let batches = db.read_table("t").await?;
        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 2);
        Ok(())
    }

    #[tokio::test]
    async fn catalog_is_rebuilt_on_reopen() -> TestResult {
        let tmp = TempDir::new()?;
        let root = tmp.path().join("db");

        {
            let mut db = Database::open(DatabaseLocation::local(&root)).await?;
            db.add_sheets(vec![sheet("t", &["a"], &[&["1"]])]).await?;
        }

        let db = Database::open(DatabaseLocation::local(&root)).await?;
        assert_eq!(db.table_names(), vec!["t"]);
        assert_eq!(db.row_count("t")?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn read_table_aligns_old_segments_after_widening() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;

        db.add_sheets(vec![sheet("t", &["amount"], &[&["1"], &["2"]])])
            .await?;
        db.append_sheet("t", sheet("t", &["amount"], &[&["2.5"]]))
            .await?;

        let batches = db.read_table("t").await?;
        for batch in &batches {
            assert_eq!(
                batch.schema().field(0).data_type(),
                &arrow::datatypes::DataType::Float64
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn export_unknown_table_fails() -> TestResult {
        let tmp = TempDir::new()?;
        let db = open_db(&tmp).await?;

        let err = db
            .export_table("nope", tmp.path().join("out.csv"))
            .await
            .expect_err("unknown table");
        assert!(matches!(err, DatabaseError::UnknownTable { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn export_unsupported_extension_fails() -> TestResult {
        let tmp = TempDir::new()?;
        let mut db = open_db(&tmp).await?;
        db.add_sheets(vec![sheet("t", &["a"], &[&["1"]])]).await?;

        let err = db
            .export_table("t", tmp.path().join("out.parquet"))
            .await
            .expect_err("unsupported format");
        assert!(matches!(
            err,
            DatabaseError::ExportFormat { extension, .. } if extension == "parquet"
        ));
        Ok(())
    }

    #[tokio::test]
    async fn destroy_removes_the_root() -> TestResult {
        let tmp = TempDir::new()?;
        let root = tmp.path().join("db");
        let mut db = Database::open(DatabaseLocation::local(&root)).await?;
        db.add_sheets(vec![sheet("t", &["a"], &[&["1"]])]).await?;

        db.destroy().await?;
        assert!(!root.exists());
        Ok(())
    }
}
