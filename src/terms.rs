use crate::error::{Result, ScanError};
use std::path::Path;

/// Reads a newline-delimited term list.
///
/// A trailing `\r` is stripped from every line, including a last line with
/// no `\n` after it. Blank lines are kept unless `skip_blank` is set.
pub fn load(path: &Path, skip_blank: bool) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path).map_err(|source| ScanError::TermListRead {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(raw
        .lines()
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .filter(|l| !(skip_blank && l.trim().is_empty()))
        .map(str::to_string)
        .collect())
}
