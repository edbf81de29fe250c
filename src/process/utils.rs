use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::MultiplyError;

/// `<stem>_<suffix><.ext>` next to `input`, or inside `output_dir` when given.
///
/// `./datasets/adult.csv` with suffix `1m` becomes `./datasets/adult_1m.csv`.
pub fn output_path_for(input: &Path, suffix: &str, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let file_name = match input.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };
    match output_dir {
        Some(dir) => dir.join(file_name),
        None => input.with_file_name(file_name),
    }
}

/// Refuse to overwrite the source. Paths are canonicalised when both exist,
/// so `./a.csv` and `a.csv` are caught too.
pub fn ensure_distinct(input: &Path, output: &Path) -> Result<(), MultiplyError> {
    let same = match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => input == output,
    };
    if same {
        return Err(MultiplyError::SameFile(output.to_path_buf()));
    }
    Ok(())
}

/// Directory a temp file for `path` must live in to be persisted atomically.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// `1234567` → `1,234,567`.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
