//! One unit of work: a single segment of a single file.

use std::path::Path;
use std::sync::Arc;

use super::tracker::FileTracker;
use crate::error::SegmentFailure;
use crate::segmenter::Segment;

/// A segment waiting in the queue or being processed by a worker.
///
/// Immutable once created, except that a failure may be recorded once.
/// Consumed by [`DownloadJob::finish`], which reports the outcome to the
/// file's tracker.
#[derive(Debug)]
pub struct DownloadJob {
    file: Arc<FileTracker>,
    segment_index: usize,
    segment: Segment,
    last_error: Option<SegmentFailure>,
}

impl DownloadJob {
    pub(crate) fn new(file: Arc<FileTracker>, segment_index: usize, segment: Segment) -> Self {
        Self {
            file,
            segment_index,
            segment,
            last_error: None,
        }
    }

    pub fn url(&self) -> &str {
        self.file.url()
    }

    pub fn file_name(&self) -> &str {
        self.file.file_name()
    }

    pub fn dest_path(&self) -> &Path {
        self.file.dest_path()
    }

    pub fn total_size(&self) -> u64 {
        self.file.total_size()
    }

    pub fn segment_index(&self) -> usize {
        self.segment_index
    }

    pub fn segment_count(&self) -> usize {
        self.file.segment_count()
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }

    pub fn last_error(&self) -> Option<&SegmentFailure> {
        self.last_error.as_ref()
    }

    /// Records why this segment failed. Only the first failure is kept.
    pub fn fail(&mut self, err: SegmentFailure) {
        if self.last_error.is_none() {
            self.last_error = Some(err);
        }
    }

    /// Hands the outcome to the file tracker. The job is discarded afterwards.
    pub fn finish(self) {
        let outcome = match self.last_error {
            Some(e) => Err(e),
            None => Ok(()),
        };
        self.file.record(self.segment_index, outcome);
    }

    /// Discards the job without running it (shutdown).
    pub(crate) fn cancel(mut self) {
        self.fail(SegmentFailure::Cancelled);
        self.finish();
    }
}
