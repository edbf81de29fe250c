// src/process/mod.rs
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::{debug, info};

use crate::multiply::{multiply, Row, Table};

pub mod progress;
pub mod utils;
pub mod writer;

use progress::{LogProgress, Progress};
use utils::{ensure_distinct, format_count};
use writer::{write_multiplied, AtomicCsvWriter};

/// What one input produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub original_rows: usize,
    pub rows_written: u64,
    pub elapsed: Duration,
}

/// Read every record of a delimited file into memory.
///
/// The first record is the header. Records keep their own field counts.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn load_table<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<Table> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut records: Vec<Row> = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))?;
        records.push(record.iter().map(str::to_string).collect());
    }
    debug!(records = records.len(), "loaded");

    Table::from_records(records)
        .with_context(|| format!("Cannot multiply {}", path.display()))
}

/// Multiply `input` to `target_rows` total rows and write it to `output`.
///
/// Nothing is written unless the input loads and validates; the output only
/// appears once every row is on disk.
#[tracing::instrument(level = "info", skip_all, fields(input = %input.display()))]
pub fn multiply_file(
    input: &Path,
    output: &Path,
    target_rows: u64,
    delimiter: u8,
    progress: &mut dyn Progress,
) -> Result<RunSummary> {
    let start = Instant::now();
    ensure_distinct(input, output)?;

    let table = load_table(input, delimiter)?;
    let batches = multiply(&table, target_rows)?;
    let plan = batches.plan();
    info!(
        original_rows = table.row_count(),
        full_passes = plan.full_passes,
        partial = plan.partial_count,
        "multiplying"
    );

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }

    let mut out = AtomicCsvWriter::new(output)?;
    let rows_written = write_multiplied(out.writer_mut(), delimiter, batches, progress)
        .with_context(|| format!("writing {}", output.display()))?;
    let output = out.finish()?;

    info!(
        "Done! {} rows (including header) written to {}",
        format_count(rows_written),
        output.display()
    );
    Ok(RunSummary {
        input: input.to_path_buf(),
        output,
        original_rows: table.row_count(),
        rows_written,
        elapsed: start.elapsed(),
    })
}

/// [`multiply_file`] with progress going to the log.
pub fn multiply_file_logged(
    input: &Path,
    output: &Path,
    target_rows: u64,
    delimiter: u8,
) -> Result<RunSummary> {
    let mut progress = LogProgress::new(input.display().to_string());
    multiply_file(input, output, target_rows, delimiter, &mut progress)
}
