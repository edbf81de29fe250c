use std::path::PathBuf;

use thiserror::Error;

/// Precondition failures raised before any output is produced.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MultiplyError {
    #[error("the input table is empty (no header row)")]
    MissingHeader,

    #[error("the input table has a header but no data rows")]
    EmptyData,

    #[error("target row count must be at least 1 (the header), got {0}")]
    InvalidTarget(u64),

    #[error("input and output must be different files to avoid data loss: {}", .0.display())]
    SameFile(PathBuf),
}
