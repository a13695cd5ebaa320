//! Per-file completion tracking.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::summary::{FailedSegment, FileReport, SummaryHandle};
use crate::error::SegmentFailure;

/// Shared by every segment of one file. The last segment to report turns
/// the collected outcomes into a [`FileReport`].
#[derive(Debug)]
pub struct FileTracker {
    url: String,
    file_name: String,
    dest_path: PathBuf,
    total_size: u64,
    segment_count: usize,
    remaining: AtomicUsize,
    failed: Mutex<Vec<FailedSegment>>,
    summary: SummaryHandle,
}

impl FileTracker {
    pub(crate) fn new(
        url: String,
        file_name: String,
        dest_path: PathBuf,
        total_size: u64,
        segment_count: usize,
        summary: SummaryHandle,
    ) -> Self {
        Self {
            url,
            file_name,
            dest_path,
            total_size,
            segment_count,
            remaining: AtomicUsize::new(segment_count),
            failed: Mutex::new(Vec::new()),
            summary,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn dest_path(&self) -> &Path {
        &self.dest_path
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    /// Segments not yet reported.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Records the outcome of segment `index`. Each segment reports exactly once.
    pub(crate) fn record(&self, index: usize, outcome: Result<(), SegmentFailure>) {
        if let Err(e) = outcome {
            let cancelled = matches!(e, SegmentFailure::Cancelled);
            self.failed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(FailedSegment {
                    index,
                    reason: e.to_string(),
                    cancelled,
                });
        }
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.complete();
        }
    }

    /// Completes a file that was partitioned into zero segments.
    pub(crate) fn complete_empty(&self) {
        if self.segment_count == 0 {
            self.complete();
        }
    }

    fn complete(&self) {
        let mut failed =
            std::mem::take(&mut *self.failed.lock().unwrap_or_else(PoisonError::into_inner));
        failed.sort_by_key(|f| f.index);

        let report = FileReport {
            url: self.url.clone(),
            file_name: self.file_name.clone(),
            dest_path: self.dest_path.clone(),
            total_size: self.total_size,
            segment_count: self.segment_count,
            failed,
        };

        if report.is_complete() {
            tracing::info!(
                file = %self.file_name,
                size = self.total_size,
                path = %self.dest_path.display(),
                "file complete"
            );
        } else {
            tracing::warn!(
                file = %self.file_name,
                missing = report.failed.len(),
                segments = self.segment_count,
                path = %self.dest_path.display(),
                "file incomplete"
            );
        }

        self.summary.release_path(&self.dest_path);
        self.summary.record_file(report);
    }
}
