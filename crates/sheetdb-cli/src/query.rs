//! Query option handling, preview rendering, and output writers.

use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

use arrow::error::ArrowError;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use sheetdb_datafusion::QueryOutput;
use snafu::ResultExt;
use tabled::{
    builder::Builder,
    settings::{Style, object::Rows, style::LineText, width::MinWidth},
};

use crate::error::{CliResult, OutputIoSnafu, OutputWriteSnafu, RenderSnafu};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

#[derive(Debug, Clone)]
pub struct QueryOpts {
    pub timing: bool,
    pub max_rows: usize,
    pub output: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone)]
pub struct QueryView {
    pub columns: Vec<String>,
    pub preview_rows: Vec<Vec<String>>,
    pub total_rows: u64,
    pub elapsed: Option<Duration>,
}

/// Reduce engine output to a bounded textual preview.
pub fn preview(out: &QueryOutput, opts: &QueryOpts, elapsed: Option<Duration>) -> CliResult<QueryView> {
    let mut preview_rows = Vec::new();
    let mut remaining = opts.max_rows;
    let options = FormatOptions::default();

    for batch in &out.batches {
        if remaining == 0 {
            break;
        }

        let formatters = batch
            .columns()
            .iter()
            .map(|col| ArrayFormatter::try_new(col.as_ref(), &options))
            .collect::<Result<Vec<_>, ArrowError>>()
            .context(RenderSnafu)?;

        let rows_to_take = remaining.min(batch.num_rows());
        for row_idx in 0..rows_to_take {
            let mut row = Vec::with_capacity(formatters.len());
            for formatter in &formatters {
                row.push(
                    formatter
                        .value(row_idx)
                        .try_to_string()
                        .context(RenderSnafu)?,
                );
            }
            preview_rows.push(row);
        }
        remaining -= rows_to_take;
    }

    Ok(QueryView {
        columns: out.columns.clone(),
        preview_rows,
        total_rows: out.row_count() as u64,
        elapsed,
    })
}

fn render_table(columns: &[String], rows: &[Vec<String>]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    const PREVIEW_LABEL: &str = "Query preview";
    const PREVIEW_OFFSET: usize = 6;
    let min_width = PREVIEW_OFFSET + PREVIEW_LABEL.len() + 4;

    let mut builder = Builder::default();
    builder.push_record(columns);
    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();

    table.with(Style::rounded());
    table.with(MinWidth::new(min_width));
    table.with(LineText::new(PREVIEW_LABEL, Rows::first()).offset(PREVIEW_OFFSET));
    // LineText re-estimates dimensions, so re-apply MinWidth afterwards.
    table.with(MinWidth::new(min_width));
    table.to_string()
}

pub fn print_query_view(view: &QueryView) {
    if !view.preview_rows.is_empty() {
        println!("{}", render_table(&view.columns, &view.preview_rows));
    }

    let shown = view.preview_rows.len() as u64;
    if shown < view.total_rows {
        println!("({shown} of {} rows shown)", view.total_rows);
    } else {
        println!("({} rows)", view.total_rows);
    }

    if let Some(elapsed) = view.elapsed {
        println!("elapsed_ms: {}", elapsed.as_millis());
    }
}

/// Write the full result set to a file in the requested format.
pub fn write_output(out: &QueryOutput, path: &Path, format: OutputFormat) -> CliResult<()> {
    let path_str = path.display().to_string();
    let file = File::create(path).context(OutputIoSnafu {
        path: path_str.clone(),
    })?;

    match format {
        OutputFormat::Csv => {
            // Arrow's CSV writer handles flat result schemas only, which is
            // all the engine produces for these tables.
            let mut writer = arrow_csv::WriterBuilder::new().with_header(true).build(file);
            for batch in &out.batches {
                writer
                    .write(batch)
                    .context(OutputWriteSnafu { path: path_str.clone() })?;
            }
        }
        OutputFormat::Jsonl => {
            let mut writer = arrow_json::LineDelimitedWriter::new(file);
            for batch in &out.batches {
                writer
                    .write_batches(&[batch])
                    .context(OutputWriteSnafu { path: path_str.clone() })?;
            }
            writer.finish().context(OutputWriteSnafu { path: path_str })?;
        }
    }

    Ok(())
}
