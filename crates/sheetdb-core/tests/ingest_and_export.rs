//! End-to-end ingestion, append, and export round-trip tests against real
//! files on disk.

use sheetdb_core::cell::Cell;
use sheetdb_core::database::{Database, DatabaseError};
use sheetdb_core::export::{CsvExportOptions, ExcelExportOptions};
use sheetdb_core::schema::{ColumnType, SchemaCompatibilityError, WidenPolicy};
use sheetdb_core::storage::DatabaseLocation;
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write test file");
    path
}

async fn open_db(tmp: &TempDir, name: &str) -> Result<Database, DatabaseError> {
    Database::open(DatabaseLocation::local(tmp.path().join(name))).await
}

#[tokio::test]
async fn add_csv_infers_types_from_file() -> TestResult {
    let tmp = TempDir::new()?;
    let csv = write_file(&tmp, "trades.csv", "id,amount\n1,10\n2,20.5\n");

    let mut db = open_db(&tmp, "db").await?;
    let created = db.add_file(&csv).await?;
    assert_eq!(created, vec!["trades"]);

    let schema = db.schema_of("trades")?;
    assert_eq!(schema.column_type("id"), Some(ColumnType::Integer));
    assert_eq!(schema.column_type("amount"), Some(ColumnType::Float));
    assert_eq!(db.row_count("trades")?, 2);
    Ok(())
}

#[tokio::test]
async fn open_with_sources_ingests_immediately() -> TestResult {
    let tmp = TempDir::new()?;
    let a = write_file(&tmp, "a.csv", "x\n1\n");
    let b = write_file(&tmp, "b.csv", "y\nhello\n");

    let db = Database::open_with_sources(
        DatabaseLocation::local(tmp.path().join("db")),
        &[a, b],
    )
    .await?;

    assert_eq!(db.table_names(), vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn append_csv_example_from_both_policies() -> TestResult {
    // The id/amount example: appending a text amount must fail under the
    // strict policy and widen to text under the permissive one.
    let tmp = TempDir::new()?;
    let base = write_file(&tmp, "t.csv", "id,amount\n1,10\n2,20.5\n");
    let bad = write_file(&tmp, "more.csv", "id,amount\n3,abc\n");

    let mut db = open_db(&tmp, "db").await?;
    db.add_file(&base).await?;

    let err = db
        .append_file_with_policy("t", &bad, WidenPolicy::Strict)
        .await
        .expect_err("strict append must fail");
    assert!(matches!(
        err,
        DatabaseError::SchemaMismatch {
            source: SchemaCompatibilityError::IncompatibleType { .. },
            ..
        }
    ));
    assert_eq!(db.row_count("t")?, 2);

    let appended = db
        .append_file_with_policy("t", &bad, WidenPolicy::Permissive)
        .await?;
    assert_eq!(appended, 1);
    assert_eq!(db.schema_of("t")?.column_type("amount"), Some(ColumnType::Text));
    assert_eq!(db.row_count("t")?, 3);
    Ok(())
}

#[tokio::test]
async fn csv_export_roundtrip_reproduces_schema() -> TestResult {
    let tmp = TempDir::new()?;
    let csv = write_file(
        &tmp,
        "orig.csv",
        "id,amount,active,joined,note\n\
         1,10.5,true,2024-03-01 09:30:00,hello\n\
         2,20.5,no,2024-03-02 10:00:00,\n",
    );

    let mut db = open_db(&tmp, "db").await?;
    db.add_file(&csv).await?;

    let exported = tmp.path().join("roundtrip.csv");
    db.export_table("orig", &exported).await?;
    db.add_file(&exported).await?;

    let original = db.schema_of("orig")?.clone();
    let reingested = db.schema_of("roundtrip")?;

    let orig_cols: Vec<_> = original
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.column_type))
        .collect();
    let back_cols: Vec<_> = reingested
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.column_type))
        .collect();
    assert_eq!(orig_cols, back_cols);
    assert_eq!(db.row_count("roundtrip")?, 2);
    Ok(())
}

#[tokio::test]
async fn widened_table_still_roundtrips_through_csv() -> TestResult {
    let tmp = TempDir::new()?;
    let base = write_file(&tmp, "t.csv", "id,amount\n1,10\n");
    let wider = write_file(&tmp, "w.csv", "id,amount\n2,20.5\n");

    let mut db = open_db(&tmp, "db").await?;
    db.add_file(&base).await?;
    db.append_file("t", &wider).await?;

    let exported = tmp.path().join("t_back.csv");
    db.export_table("t", &exported).await?;
    db.add_file(&exported).await?;

    // The previously widened Integer-now-Float column legitimately
    // re-infers as Float.
    assert_eq!(
        db.schema_of("t_back")?.column_type("amount"),
        Some(ColumnType::Float)
    );
    assert_eq!(db.row_count("t_back")?, 2);
    Ok(())
}

#[tokio::test]
async fn excel_workbook_creates_one_table_per_sheet() -> TestResult {
    let tmp = TempDir::new()?;

    // Build a two-sheet workbook through the export engine itself.
    let seed = write_file(&tmp, "people.csv", "id,name\n1,Alice\n2,Bob\n");
    let seed2 = write_file(&tmp, "scores.csv", "name,score\nAlice,9.5\nBob,8.0\n");
    let mut staging = open_db(&tmp, "staging").await?;
    staging.add_files(&[seed, seed2]).await?;
    let workbook = tmp.path().join("book.xlsx");
    staging
        .export_all_excel(&workbook, &ExcelExportOptions::default())
        .await?;

    let mut db = open_db(&tmp, "db").await?;
    let created = db.add_file(&workbook).await?;
    assert_eq!(created, vec!["people", "scores"]);

    assert_eq!(db.schema_of("people")?.column_type("id"), Some(ColumnType::Integer));
    assert_eq!(db.schema_of("people")?.column_type("name"), Some(ColumnType::Text));
    assert_eq!(
        db.schema_of("scores")?.column_type("score"),
        Some(ColumnType::Float)
    );
    Ok(())
}

#[tokio::test]
async fn excel_roundtrip_keeps_datetime_columns() -> TestResult {
    let tmp = TempDir::new()?;
    let csv = write_file(
        &tmp,
        "events.csv",
        "name,at\nlaunch,2024-03-01 09:30:00\nretro,2024-03-08 15:00:00\n",
    );

    let mut db = open_db(&tmp, "db").await?;
    db.add_file(&csv).await?;
    assert_eq!(
        db.schema_of("events")?.column_type("at"),
        Some(ColumnType::DateTime)
    );

    let exported = tmp.path().join("events.xlsx");
    db.export_table("events", &exported).await?;

    // Re-ingest into a fresh database: the worksheet keeps the table name.
    let mut db2 = open_db(&tmp, "db2").await?;
    let created = db2.add_file(&exported).await?;
    assert_eq!(created, vec!["events"]);
    assert_eq!(
        db2.schema_of("events")?.column_type("at"),
        Some(ColumnType::DateTime)
    );
    assert_eq!(db2.row_count("events")?, 2);
    Ok(())
}

#[tokio::test]
async fn export_all_csv_names_and_excludes() -> TestResult {
    let tmp = TempDir::new()?;
    let a = write_file(&tmp, "alpha.csv", "x\n1\n");
    let b = write_file(&tmp, "beta.csv", "y\n2\n");

    let mut db = open_db(&tmp, "mydb").await?;
    db.add_files(&[a, b]).await?;

    let out_dir = tmp.path().join("out");
    let opts = CsvExportOptions {
        exclude: vec!["beta".to_string()],
        include_db_name: true,
    };
    let written = db.export_all_csv(&out_dir, &opts).await?;

    assert_eq!(written.len(), 1);
    assert!(written[0].ends_with("mydb_alpha.csv"));
    assert!(out_dir.join("mydb_alpha.csv").exists());
    assert!(!out_dir.join("mydb_beta.csv").exists());
    Ok(())
}

#[tokio::test]
async fn missing_cells_survive_ingestion_as_nulls() -> TestResult {
    let tmp = TempDir::new()?;
    let csv = write_file(&tmp, "t.csv", "id,note\n1,\n2,hi\n");

    let mut db = open_db(&tmp, "db").await?;
    db.add_file(&csv).await?;

    let batches = db.read_table("t").await?;
    assert_eq!(batches.len(), 1);
    assert!(batches[0].column(1).is_null(0));
    assert!(!batches[0].column(1).is_null(1));
    Ok(())
}

#[tokio::test]
async fn all_missing_column_is_text() -> TestResult {
    let tmp = TempDir::new()?;
    let csv = write_file(&tmp, "t.csv", "id,empty\n1,\n2,\n");

    let mut db = open_db(&tmp, "db").await?;
    db.add_file(&csv).await?;

    assert_eq!(db.schema_of("t")?.column_type("empty"), Some(ColumnType::Text));
    Ok(())
}

#[tokio::test]
async fn workbook_cells_roundtrip_values() -> TestResult {
    let tmp = TempDir::new()?;
    let csv = write_file(&tmp, "t.csv", "id,amount\n7,1.25\n");

    let mut db = open_db(&tmp, "db").await?;
    db.add_file(&csv).await?;

    let workbook = tmp.path().join("t.xlsx");
    db.export_table("t", &workbook).await?;

    let sheets = sheetdb_core::reader::read_tabular_file(&workbook)?;
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].rows()[0][0], Cell::Float(7.0));
    assert_eq!(sheets[0].rows()[0][1], Cell::Float(1.25));
    Ok(())
}
