// src/batch.rs
use anyhow::Result;
use chrono::Utc;
use glob::glob;
use rayon::prelude::*;
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    process::{multiply_file_logged, utils::output_path_for},
    report::{write_report, Record},
};

/// Expand configured inputs.
///
/// An existing file is taken literally even if its name holds glob
/// characters. Missing files, bad patterns and patterns with no match come
/// back as failures rather than aborting the run. A file named twice (say
/// `a.csv` and `*.csv`) is kept once, in first-seen order.
pub fn resolve_inputs(inputs: &[String]) -> (Vec<PathBuf>, Vec<Record>) {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    let mut missing = Vec::new();
    let mut keep = |path: PathBuf, found: &mut Vec<PathBuf>| {
        let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if seen.insert(key) {
            found.push(path);
        } else {
            debug!("skipping duplicate input {}", path.display());
        }
    };

    for input in inputs {
        let path = PathBuf::from(input);
        if path.is_file() {
            keep(path, &mut found);
            continue;
        }
        if !input.contains(['*', '?', '[']) {
            error!("Input file '{}' does not exist", input);
            missing.push(Record::failed(
                &path,
                &anyhow::anyhow!("input file does not exist"),
            ));
            continue;
        }

        let entries = match glob(input) {
            Ok(entries) => entries,
            Err(e) => {
                let err = anyhow::Error::new(e)
                    .context(format!("Failed to read glob pattern '{}'", input));
                error!("{:#}", err);
                missing.push(Record::failed(&path, &err));
                continue;
            }
        };
        let mut matched = 0;
        for entry in entries {
            match entry {
                Ok(p) if p.is_file() => {
                    matched += 1;
                    keep(p, &mut found);
                }
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable match for '{}': {}", input, e),
            }
        }
        if matched == 0 {
            warn!("No files match '{}'", input);
            missing.push(Record::failed(
                &path,
                &anyhow::anyhow!("no files match pattern"),
            ));
        }
    }
    (found, missing)
}

fn process_one(cfg: &Config, suffix: &str, delimiter: u8, input: &Path) -> Record {
    let output = output_path_for(input, suffix, cfg.output_dir.as_deref());
    info!("Processing {}...", input.display());
    match multiply_file_logged(input, &output, cfg.target_rows, delimiter) {
        Ok(summary) => Record::ok(&summary, Utc::now()),
        Err(e) => {
            error!("{}: {:#}", input.display(), e);
            Record::failed(input, &e)
        }
    }
}

/// Multiply every configured input. A failing input is reported and the
/// rest still run. The report, if configured, is written at the end.
pub fn run(cfg: &Config) -> Result<Vec<Record>> {
    cfg.validate()?;
    let delimiter = cfg.delimiter_byte()?;
    let suffix = cfg.suffix();

    let (inputs, mut records) = resolve_inputs(&cfg.inputs);
    info!(
        files = inputs.len(),
        target_rows = cfg.target_rows,
        parallel = cfg.parallel,
        "starting"
    );

    let processed: Vec<Record> = if cfg.parallel {
        inputs
            .par_iter()
            .map(|input| process_one(cfg, &suffix, delimiter, input))
            .collect()
    } else {
        inputs
            .iter()
            .map(|input| process_one(cfg, &suffix, delimiter, input))
            .collect()
    };
    records.extend(processed);

    if let Some(report) = &cfg.report {
        write_report(report, &records)?;
        info!("report written to {}", report.display());
    }

    let failed = records.iter().filter(|r| !r.is_ok()).count();
    info!(ok = records.len() - failed, failed, "all done");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::TempDir;

    fn cfg_for(dir: &Path, inputs: Vec<String>) -> Config {
        Config {
            inputs,
            target_rows: 10,
            output_dir: Some(dir.join("out")),
            report: Some(dir.join("report.json")),
            ..Config::default()
        }
    }

    #[test]
    fn bad_input_does_not_stop_the_batch() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("good.csv"), "a\n1\n2\n3\n")?;
        fs::write(dir.path().join("empty.csv"), "a\n")?;
        let missing = dir.path().join("missing.csv");

        let cfg = cfg_for(
            dir.path(),
            vec![
                dir.path().join("empty.csv").display().to_string(),
                missing.display().to_string(),
                dir.path().join("good.csv").display().to_string(),
            ],
        );
        let records = run(&cfg)?;
        assert_eq!(records.len(), 3);
        assert_eq!(records.iter().filter(|r| r.is_ok()).count(), 1);

        let out = fs::read_to_string(dir.path().join("out").join("good_10.csv"))?;
        assert_eq!(out.lines().count(), 10);
        assert!(!dir.path().join("out").join("empty_10.csv").exists());
        assert!(dir.path().join("report.json").exists());
        Ok(())
    }

    #[test]
    fn globs_and_parallel_runs() -> Result<()> {
        let dir = TempDir::new()?;
        for name in ["x.csv", "y.csv", "z.csv"] {
            fs::write(dir.path().join(name), "h,v\nk,1\nk,2\n")?;
        }
        let mut cfg = cfg_for(
            dir.path(),
            vec![format!("{}/*.csv", dir.path().display())],
        );
        cfg.parallel = true;
        cfg.output_suffix = Some("big".into());

        let records = run(&cfg)?;
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(Record::is_ok));
        for name in ["x_big.csv", "y_big.csv", "z_big.csv"] {
            let text = fs::read_to_string(dir.path().join("out").join(name))?;
            assert_eq!(text.lines().count(), 10);
            assert_eq!(text.lines().next(), Some("h,v"));
        }
        Ok(())
    }

    #[test]
    fn unmatched_pattern_is_reported() -> Result<()> {
        let dir = TempDir::new()?;
        let (found, missing) = resolve_inputs(&[format!("{}/*.nothing", dir.path().display())]);
        assert!(found.is_empty());
        assert_eq!(missing.len(), 1);
        Ok(())
    }

    #[test]
    fn invalid_pattern_is_reported_and_the_rest_run() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("good.csv"), "a\n1\n")?;
        let cfg = cfg_for(
            dir.path(),
            vec![
                format!("{}/[bad", dir.path().display()),
                dir.path().join("good.csv").display().to_string(),
            ],
        );

        let records = run(&cfg)?;
        assert_eq!(records.len(), 2);
        assert!(matches!(&records[0], Record::Failed { error, .. } if error.contains("glob pattern")));
        assert!(records[1].is_ok());
        assert!(dir.path().join("out").join("good_10.csv").exists());
        assert!(dir.path().join("report.json").exists());
        Ok(())
    }

    #[test]
    fn existing_file_with_glob_characters_is_literal() -> Result<()> {
        let dir = TempDir::new()?;
        let odd = dir.path().join("data[1].csv");
        fs::write(&odd, "a\n1\n")?;

        let (found, missing) = resolve_inputs(&[odd.display().to_string()]);
        assert_eq!(found, vec![odd]);
        assert!(missing.is_empty());
        Ok(())
    }

    #[test]
    fn inputs_named_twice_run_once() -> Result<()> {
        let dir = TempDir::new()?;
        let a = dir.path().join("a.csv");
        fs::write(&a, "h\n1\n")?;
        fs::write(dir.path().join("b.csv"), "h\n2\n")?;
        let inputs = vec![
            a.display().to_string(),
            format!("{}/*.csv", dir.path().display()),
            dir.path().join(".").join("a.csv").display().to_string(),
        ];

        let (found, missing) = resolve_inputs(&inputs);
        assert!(missing.is_empty());
        assert_eq!(found, vec![a, dir.path().join("b.csv")]);

        let mut cfg = cfg_for(dir.path(), inputs);
        cfg.parallel = true;
        let records = run(&cfg)?;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(Record::is_ok));
        Ok(())
    }

    #[test]
    fn empty_config_is_rejected() {
        assert!(run(&Config::default()).is_err());
    }
}
