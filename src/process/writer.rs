//! Atomic CSV output.
//!
//! Rows go to a temporary file beside the destination, which is persisted
//! over the destination only by [`AtomicCsvWriter::finish`]. Dropping the
//! writer early deletes the temporary file, so a failed run leaves nothing
//! behind.

use anyhow::{anyhow, Context, Result};
use csv::WriterBuilder;
use std::{
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

use super::{progress::Progress, utils::parent_dir};
use crate::multiply::{Multiplied, Row};

pub struct AtomicCsvWriter {
    writer: BufWriter<NamedTempFile>,
    final_path: PathBuf,
}

impl AtomicCsvWriter {
    pub fn new(final_path: impl AsRef<Path>) -> Result<Self> {
        let final_path = final_path.as_ref().to_path_buf();
        let dir = parent_dir(&final_path);
        let temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temporary file in {}", dir.display()))?;
        Ok(Self {
            writer: BufWriter::new(temp),
            final_path,
        })
    }

    pub fn writer_mut(&mut self) -> &mut BufWriter<NamedTempFile> {
        &mut self.writer
    }

    /// Flush everything and move the temporary file into place.
    pub fn finish(self) -> Result<PathBuf> {
        let temp = self
            .writer
            .into_inner()
            .map_err(|e| anyhow!("flushing output buffer: {}", e.error()))?;
        temp.persist(&self.final_path)
            .map_err(|e| e.error)
            .with_context(|| format!("persisting {}", self.final_path.display()))?;
        Ok(self.final_path)
    }
}

/// Rows serialized once, with the byte offset where each row ends.
#[derive(Debug)]
struct EncodedRows {
    bytes: Vec<u8>,
    ends: Vec<usize>,
}

impl EncodedRows {
    fn encode(rows: &[Row], delimiter: u8) -> Result<Self> {
        let mut w = WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_writer(Vec::new());
        let mut ends = Vec::with_capacity(rows.len());
        for row in rows {
            w.write_record(row).context("encoding row")?;
            w.flush().context("encoding row")?;
            ends.push(w.get_ref().len());
        }
        let bytes = w
            .into_inner()
            .map_err(|e| anyhow!("encoding rows: {}", e.error()))?;
        Ok(Self { bytes, ends })
    }

    /// Bytes of the first `n` rows.
    fn prefix(&self, n: usize) -> &[u8] {
        match n {
            0 => &[],
            n => &self.bytes[..self.ends[n - 1]],
        }
    }
}

/// Write the header once, then every batch in order, reporting after each.
///
/// The data rows are quoted and escaped once up front. Every batch is a
/// prefix of them (a full pass being the whole set), so each one goes out
/// as a single contiguous write.
///
/// Returns the final row count, header included.
pub fn write_multiplied<W: Write>(
    out: &mut W,
    delimiter: u8,
    mut batches: Multiplied<'_>,
    progress: &mut dyn Progress,
) -> Result<u64> {
    let target = batches.target_rows();
    let header = EncodedRows::encode(std::slice::from_ref(batches.header()), delimiter)?;
    out.write_all(&header.bytes).context("writing header")?;
    progress.update(batches.rows_written(), target);

    let encoded = EncodedRows::encode(batches.rows(), delimiter)?;
    for batch in batches.by_ref() {
        out.write_all(encoded.prefix(batch.rows.len()))
            .context("writing rows")?;
        progress.update(batch.rows_written, target);
    }
    out.flush().context("flushing rows")?;
    Ok(batches.rows_written())
}
