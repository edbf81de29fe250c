// src/config.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_TARGET_ROWS: u64 = 1_000_000;

/// Run configuration. Loaded from YAML, then overridden from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Input paths or glob patterns.
    pub inputs: Vec<String>,
    /// Total output rows, header included.
    pub target_rows: u64,
    /// Appended to the input stem; derived from `target_rows` when unset.
    pub output_suffix: Option<String>,
    /// Write outputs here instead of next to each input.
    pub output_dir: Option<PathBuf>,
    pub delimiter: char,
    pub parallel: bool,
    /// Optional JSON run report.
    pub report: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            target_rows: DEFAULT_TARGET_ROWS,
            output_suffix: None,
            output_dir: None,
            delimiter: ',',
            parallel: false,
            report: None,
        }
    }
}

impl Config {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Delimiter as the single byte the CSV reader expects.
    pub fn delimiter_byte(&self) -> Result<u8> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter must be a single ASCII character, got {:?}", self.delimiter);
        }
        Ok(self.delimiter as u8)
    }

    pub fn suffix(&self) -> String {
        self.output_suffix
            .clone()
            .unwrap_or_else(|| suffix_for_target(self.target_rows))
    }

    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("no input files given");
        }
        if self.target_rows < 1 {
            bail!("target_rows must be at least 1, got {}", self.target_rows);
        }
        self.delimiter_byte()?;
        Ok(())
    }
}

/// `1_000_000` → `1m`, `5_000` → `5k`, anything else verbatim.
pub fn suffix_for_target(target_rows: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "b"), (1_000_000, "m"), (1_000, "k")];
    for (scale, unit) in UNITS {
        if target_rows >= scale && target_rows % scale == 0 {
            return format!("{}{}", target_rows / scale, unit);
        }
    }
    target_rows.to_string()
}
