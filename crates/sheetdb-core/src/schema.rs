//! Schema model: column types, table schemas, inference, and append
//! reconciliation.
//!
//! The widening lattice (`Integer < Float < Text`; `Boolean` and `DateTime`
//! incomparable with the numeric chain, both widening to `Text`) lives in
//! [`ColumnType::widen`] and is the single source of truth for both the
//! inference engine and the append pipeline.

pub mod column_type;
pub mod compat;
pub mod infer;
pub mod table_schema;

pub use column_type::ColumnType;
pub use compat::{SchemaCompatibilityError, WidenPolicy, reconcile};
pub use infer::infer_column_type;
pub use table_schema::{Column, SchemaError, TableSchema, normalize_table_name};
