//! Run-wide bookkeeping: per-file reports and the final summary.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A segment that did not make it into the destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSegment {
    pub index: usize,
    pub reason: String,
    /// Skipped because of shutdown rather than failed.
    pub cancelled: bool,
}

/// Outcome for one file once every segment has been accounted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub url: String,
    pub file_name: String,
    pub dest_path: PathBuf,
    pub total_size: u64,
    pub segment_count: usize,
    /// Sorted by segment index.
    pub failed: Vec<FailedSegment>,
}

impl FileReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn segments_ok(&self) -> usize {
        self.segment_count - self.failed.len()
    }
}

/// Everything that happened during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files: Vec<FileReport>,
    /// Links refused at intake: (raw link, reason).
    pub rejected_links: Vec<(String, String)>,
    /// URLs dropped before partitioning (metadata or destination failure): (url, reason).
    pub failed_urls: Vec<(String, String)>,
}

impl RunSummary {
    pub fn files_complete(&self) -> usize {
        self.files.iter().filter(|f| f.is_complete()).count()
    }

    pub fn files_incomplete(&self) -> usize {
        self.files.len() - self.files_complete()
    }

    /// True when no file, URL or link failed.
    pub fn is_success(&self) -> bool {
        self.files_incomplete() == 0 && self.failed_urls.is_empty() && self.rejected_links.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} file(s) complete, {} incomplete, {} URL(s) failed, {} link(s) rejected",
            self.files_complete(),
            self.files_incomplete(),
            self.failed_urls.len(),
            self.rejected_links.len()
        )?;
        for file in &self.files {
            if file.is_complete() {
                writeln!(
                    f,
                    "  [ok]   {} ({} bytes, {} segment(s)) -> {}",
                    file.file_name,
                    file.total_size,
                    file.segment_count,
                    file.dest_path.display()
                )?;
            } else {
                writeln!(
                    f,
                    "  [FAIL] {}: {}/{} segment(s) missing -> {}",
                    file.file_name,
                    file.failed.len(),
                    file.segment_count,
                    file.dest_path.display()
                )?;
                for seg in &file.failed {
                    writeln!(f, "         segment {}: {}", seg.index, seg.reason)?;
                }
            }
        }
        for (url, reason) in &self.failed_urls {
            writeln!(f, "  [skip] {}: {}", url, reason)?;
        }
        for (link, reason) in &self.rejected_links {
            writeln!(f, "  [bad]  {}: {}", link, reason)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Inner {
    summary: Mutex<RunSummary>,
    /// Destination path -> number of unfinished files writing to it.
    active_paths: Mutex<HashMap<PathBuf, usize>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared handle to the run's summary. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct SummaryHandle {
    inner: Arc<Inner>,
}

impl SummaryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RunSummary {
        lock(&self.inner.summary).clone()
    }

    pub(crate) fn record_file(&self, report: FileReport) {
        lock(&self.inner.summary).files.push(report);
    }

    pub(crate) fn record_rejected(&self, link: &str, reason: String) {
        lock(&self.inner.summary)
            .rejected_links
            .push((link.to_string(), reason));
    }

    pub(crate) fn record_failed_url(&self, url: &str, reason: String) {
        lock(&self.inner.summary)
            .failed_urls
            .push((url.to_string(), reason));
    }

    /// Marks `path` as being written; returns how many other unfinished files already use it.
    pub(crate) fn claim_path(&self, path: &Path) -> usize {
        let mut active = lock(&self.inner.active_paths);
        let users = active.entry(path.to_path_buf()).or_insert(0);
        *users += 1;
        *users - 1
    }

    pub(crate) fn release_path(&self, path: &Path) {
        let mut active = lock(&self.inner.active_paths);
        if let Some(users) = active.get_mut(path) {
            *users -= 1;
            if *users == 0 {
                active.remove(path);
            }
        }
    }
}
