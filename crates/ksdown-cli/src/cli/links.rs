//! Links from the command line and from URL list files.

use anyhow::{Context, Result};
use ksdown_core::intake::split_batch;
use std::path::Path;

/// Reads a link list: one entry per line, LF or CRLF, blank lines and `#` comments skipped.
pub fn read_list_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read link file {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Links from `-f` (first) and `-u`, in that order.
pub fn collect(urls: Option<&str>, file: Option<&Path>) -> Result<Vec<String>> {
    let mut out = match file {
        Some(path) => read_list_file(path)?,
        None => Vec::new(),
    };
    if let Some(urls) = urls {
        out.extend(split_batch(urls));
    }
    Ok(out)
}
