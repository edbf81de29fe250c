// src/bin/verify.rs

use anyhow::{Context, Result};
use clap::Parser;
use csv::ReaderBuilder;
use glob::glob;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

/// Count rows (header included) of multiplied files and compare to a target.
#[derive(Debug, Parser)]
struct Args {
    /// Expected total rows per file.
    #[arg(short, long, default_value_t = 1_000_000)]
    expected: u64,

    #[arg(short, long, default_value_t = ',')]
    delimiter: char,

    /// Files or glob patterns to check.
    #[arg(required = true)]
    patterns: Vec<String>,
}

fn count_rows(path: &Path, delimiter: u8) -> Result<u64> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Failed to open '{}'", path.display()))?;
    let mut record = csv::ByteRecord::new();
    let mut n = 0u64;
    while rdr
        .read_byte_record(&mut record)
        .with_context(|| format!("Failed to read a record of '{}'", path.display()))?
    {
        n += 1;
    }
    Ok(n)
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let args = Args::parse();
    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be ASCII");
    }
    let delimiter = args.delimiter as u8;

    // 1) Expand patterns
    let mut paths: Vec<PathBuf> = Vec::new();
    for pattern in &args.patterns {
        for entry in glob(pattern)
            .with_context(|| format!("Failed to read glob pattern '{}'", pattern))?
        {
            match entry {
                Ok(path) => paths.push(path),
                Err(e) => warn!("Skipping unreadable match for '{}': {}", pattern, e),
            }
        }
    }
    if paths.is_empty() {
        return Err(anyhow::anyhow!("No files found under {:?}", args.patterns));
    }

    // 2) In parallel: count rows per file
    let counts: Vec<u64> = paths
        .par_iter()
        .map(|p| count_rows(p, delimiter))
        .collect::<Result<Vec<_>>>()?;

    // 3) Print summary table
    println!(
        "\n{: <40} {:>15} {:>15}",
        "File", "Rows", "Delta vs target"
    );
    println!("{:-<72}", "");
    let mut mismatched = 0;
    for (path, count) in paths.iter().zip(&counts) {
        let delta = *count as i128 - args.expected as i128;
        if delta != 0 {
            mismatched += 1;
        }
        println!("{: <40} {:>15} {:>15}", path.display(), count, delta);
    }

    if mismatched > 0 {
        anyhow::bail!("{} of {} files do not have {} rows", mismatched, paths.len(), args.expected);
    }
    Ok(())
}
