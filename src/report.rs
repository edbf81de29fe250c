use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path};

use crate::process::RunSummary;

/// One line of the run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Record {
    Ok {
        input: String,
        output: String,
        original_rows: usize,
        rows_written: u64,
        elapsed_seconds: f64,
        finished_at: DateTime<Utc>,
    },
    Failed {
        input: String,
        error: String,
    },
}

impl Record {
    pub fn ok(summary: &RunSummary, finished_at: DateTime<Utc>) -> Self {
        Record::Ok {
            input: summary.input.display().to_string(),
            output: summary.output.display().to_string(),
            original_rows: summary.original_rows,
            rows_written: summary.rows_written,
            elapsed_seconds: summary.elapsed.as_secs_f64(),
            finished_at,
        }
    }

    pub fn failed(input: &Path, error: &anyhow::Error) -> Self {
        Record::Failed {
            input: input.display().to_string(),
            error: format!("{:#}", error),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Record::Ok { .. })
    }
}

pub fn write_report(path: &Path, records: &[Record]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("creating report {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), records)
        .with_context(|| format!("writing report {}", path.display()))?;
    Ok(())
}
