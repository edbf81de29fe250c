use anyhow::Result;
use clap::Parser;
use csvmultiply::{batch, config::Config};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Inflate CSV files to a fixed row count by repeating their data rows.
#[derive(Debug, Parser)]
#[command(name = "csvmultiply", version)]
struct Cli {
    /// YAML config; command-line values override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total rows per output file, header included.
    #[arg(short, long)]
    target: Option<u64>,

    /// Output name suffix (`adult.csv` -> `adult_<suffix>.csv`).
    #[arg(short, long)]
    suffix: Option<String>,

    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[arg(short, long)]
    delimiter: Option<char>,

    /// Process inputs concurrently.
    #[arg(short, long)]
    parallel: bool,

    /// Write a JSON report of every input's outcome.
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Input files or glob patterns.
    inputs: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_yaml_file(path)?,
            None => Config::default(),
        };
        if !self.inputs.is_empty() {
            cfg.inputs = self.inputs;
        }
        if let Some(target) = self.target {
            cfg.target_rows = target;
        }
        if self.suffix.is_some() {
            cfg.output_suffix = self.suffix;
        }
        if self.output_dir.is_some() {
            cfg.output_dir = self.output_dir;
        }
        if let Some(d) = self.delimiter {
            cfg.delimiter = d;
        }
        cfg.parallel |= self.parallel;
        if self.report.is_some() {
            cfg.report = self.report;
        }
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let cfg = Cli::parse().into_config()?;
    let records = batch::run(&cfg)?;

    let failed = records.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        error!("{} of {} inputs failed", failed, records.len());
        std::process::exit(1);
    }
    info!("{} inputs done", records.len());
    Ok(())
}
