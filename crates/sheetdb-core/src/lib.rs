//! Core engine for `sheetdb`: a relational database over spreadsheet files.
//!
//! This crate provides the foundational pieces for `sheetdb`:
//!
//! - A tagged cell representation for raw tabular values and a
//!   schema-inference engine that maps heterogeneous input columns onto a
//!   small lattice of column types (`cell`, `schema` modules).
//! - Tabular file readers that turn CSV files and multi-sheet workbooks
//!   into uniform header-plus-rows units (`reader` module).
//! - A per-database catalog of table manifests, rebuilt from disk on open
//!   so the registry and the stored tables cannot diverge (`catalog`
//!   module).
//! - A `Database` abstraction with add/append/export operations backed by
//!   Parquet segments under the database root (`database`, `segment`,
//!   `export` modules).
//! - Filesystem utilities for the on-disk layout (manifests, segment
//!   paths, atomic writes) (`storage` module).
//!
//! Query execution lives in the separate `sheetdb-datafusion` crate; this
//! crate deliberately has no query-engine dependency.
#![deny(missing_docs)]
pub mod catalog;
pub mod cell;
pub mod database;
pub mod export;
pub mod reader;
pub mod schema;
pub mod segment;
pub mod sheet;
pub mod storage;
