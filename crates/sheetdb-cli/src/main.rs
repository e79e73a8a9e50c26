//! CLI tool for treating spreadsheet/CSV files as a queryable database.

mod error;
mod query;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use sheetdb_core::database::Database;
use sheetdb_core::export::{CsvExportOptions, ExcelExportOptions};
use sheetdb_core::schema::WidenPolicy;
use sheetdb_core::storage::DatabaseLocation;
use snafu::ResultExt;

use crate::error::{
    AddDataSnafu, AppendDataSnafu, CliResult, ExportDataSnafu, InspectTableSnafu,
    OpenDatabaseSnafu,
};
use crate::query::{OutputFormat, QueryOpts};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Csv,
    Jsonl,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(v: OutputFormatArg) -> Self {
        match v {
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load tabular files into new tables (one table per CSV file or
    /// worksheet)
    Add {
        #[arg(long)]
        db: PathBuf,

        /// Files to ingest (.csv, .xlsx, .xls, ...)
        files: Vec<PathBuf>,
    },

    /// Append a file's rows to an existing table
    Append {
        #[arg(long)]
        db: PathBuf,

        #[arg(long)]
        table: String,

        file: PathBuf,

        /// Reject appends that would widen a non-text column to text
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Print elapsed time for the append
        #[arg(long, default_value_t = false)]
        timing: bool,
    },

    /// Execute a SQL query against the database
    Query {
        #[arg(long)]
        db: PathBuf,

        #[arg(long)]
        sql: String,

        #[arg(long, default_value_t = 10)]
        max_rows: usize,

        #[arg(long, default_value_t = false)]
        timing: bool,

        /// Write the full result set to this file
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormatArg::Csv)]
        format: OutputFormatArg,
    },

    /// Export one table to a file; the format follows the extension
    /// (.csv or .xlsx)
    Export {
        #[arg(long)]
        db: PathBuf,

        #[arg(long)]
        table: String,

        #[arg(long)]
        output: PathBuf,
    },

    /// Export every table to one CSV file per table
    ExportCsv {
        #[arg(long)]
        db: PathBuf,

        /// Target directory for the CSV files
        #[arg(long)]
        dir: PathBuf,

        /// Repeatable table names to leave out
        #[arg(long)]
        exclude: Vec<String>,

        /// Name files `<table>.csv` instead of `<db>_<table>.csv`
        #[arg(long, default_value_t = false)]
        no_db_prefix: bool,
    },

    /// Export every table as one worksheet of a single workbook
    ExportExcel {
        #[arg(long)]
        db: PathBuf,

        #[arg(long)]
        output: PathBuf,

        /// Repeatable table names to leave out
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// List tables with their schemas and row counts
    Tables {
        #[arg(long)]
        db: PathBuf,
    },
}

#[derive(Debug, Parser)]
#[command(name = "sheetdb", about = "Query spreadsheet and CSV files with SQL")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

async fn open_database(db: &PathBuf) -> CliResult<Database> {
    Database::open(DatabaseLocation::local(db)).await.context(OpenDatabaseSnafu {
        db: db.display().to_string(),
    })
}

async fn cmd_add(db_path: PathBuf, files: Vec<PathBuf>) -> CliResult<()> {
    let mut db = open_database(&db_path).await?;
    let created = db.add_files(&files).await.context(AddDataSnafu {
        db: db_path.display().to_string(),
    })?;

    for table in &created {
        let rows = db.row_count(table).context(InspectTableSnafu {
            table: table.clone(),
        })?;
        println!("Created table '{table}' ({rows} rows)");
    }
    Ok(())
}

async fn cmd_append(
    db_path: PathBuf,
    table: String,
    file: PathBuf,
    strict: bool,
    timing: bool,
) -> CliResult<()> {
    let start = Instant::now();
    let mut db = open_database(&db_path).await?;

    let policy = if strict {
        WidenPolicy::Strict
    } else {
        WidenPolicy::Permissive
    };
    let rows = db
        .append_file_with_policy(&table, &file, policy)
        .await
        .context(AppendDataSnafu { table: table.clone() })?;

    if timing {
        println!(
            "Appended {rows} rows to '{table}' (elapsed_ms: {})",
            start.elapsed().as_millis()
        );
    } else {
        println!("Appended {rows} rows to '{table}'");
    }
    Ok(())
}

async fn cmd_query(db_path: PathBuf, sql: String, opts: QueryOpts) -> CliResult<()> {
    let db = open_database(&db_path).await?;

    let start = Instant::now();
    let out = sheetdb_datafusion::run_query(&db, &sql).await?;
    let elapsed = opts.timing.then(|| start.elapsed());

    if let Some(path) = &opts.output {
        query::write_output(&out, path, opts.format)?;
    }

    let view = query::preview(&out, &opts, elapsed)?;
    query::print_query_view(&view);
    Ok(())
}

async fn cmd_export(db_path: PathBuf, table: String, output: PathBuf) -> CliResult<()> {
    let db = open_database(&db_path).await?;
    db.export_table(&table, &output).await.context(ExportDataSnafu {
        db: db_path.display().to_string(),
    })?;

    println!("Exported '{table}' to {}", output.display());
    Ok(())
}

async fn cmd_export_csv(
    db_path: PathBuf,
    dir: PathBuf,
    exclude: Vec<String>,
    no_db_prefix: bool,
) -> CliResult<()> {
    let db = open_database(&db_path).await?;
    let opts = CsvExportOptions {
        exclude,
        include_db_name: !no_db_prefix,
    };
    let written = db.export_all_csv(&dir, &opts).await.context(ExportDataSnafu {
        db: db_path.display().to_string(),
    })?;

    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

async fn cmd_export_excel(
    db_path: PathBuf,
    output: PathBuf,
    exclude: Vec<String>,
) -> CliResult<()> {
    let db = open_database(&db_path).await?;
    let opts = ExcelExportOptions { exclude };
    db.export_all_excel(&output, &opts)
        .await
        .context(ExportDataSnafu {
            db: db_path.display().to_string(),
        })?;

    println!("Wrote {}", output.display());
    Ok(())
}

async fn cmd_tables(db_path: PathBuf) -> CliResult<()> {
    let db = open_database(&db_path).await?;

    let names: Vec<String> = db.table_names().iter().map(|n| n.to_string()).collect();
    if names.is_empty() {
        println!("No tables");
        return Ok(());
    }

    for name in names {
        let schema = db.schema_of(&name).context(InspectTableSnafu {
            table: name.clone(),
        })?;
        let rows = db.row_count(&name).context(InspectTableSnafu {
            table: name.clone(),
        })?;
        println!("{name} ({rows} rows): {schema}");
    }
    Ok(())
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Command::Add { db, files } => cmd_add(db, files).await,

        Command::Append {
            db,
            table,
            file,
            strict,
            timing,
        } => cmd_append(db, table, file, strict, timing).await,

        Command::Query {
            db,
            sql,
            max_rows,
            timing,
            output,
            format,
        } => {
            cmd_query(
                db,
                sql,
                QueryOpts {
                    timing,
                    max_rows,
                    output,
                    format: format.into(),
                },
            )
            .await
        }

        Command::Export { db, table, output } => cmd_export(db, table, output).await,

        Command::ExportCsv {
            db,
            dir,
            exclude,
            no_db_prefix,
        } => cmd_export_csv(db, dir, exclude, no_db_prefix).await,

        Command::ExportExcel {
            db,
            output,
            exclude,
        } => cmd_export_excel(db, output, exclude).await,

        Command::Tables { db } => cmd_tables(db).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
