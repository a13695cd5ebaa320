//! Worker loop: dequeue a job, fetch its range, write it at its offset.

use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::job::DownloadJob;
use super::{Context, POLL_INTERVAL};
use crate::error::SegmentFailure;
use crate::http::{self, HttpOptions};
use crate::storage;

/// Runs until the queue is closed and empty, or shutdown is requested.
/// A job already taken is always finished, including after shutdown.
pub(super) fn run(worker: usize, rx: Receiver<DownloadJob>, ctx: &Context) {
    tracing::debug!(worker, "worker started");
    loop {
        if ctx.shutdown.is_triggered() {
            break;
        }
        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(job) => process(worker, job, &ctx.http),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!(worker, "worker stopped");
}

fn process(worker: usize, mut job: DownloadJob, opts: &HttpOptions) {
    let seg = job.segment();
    tracing::debug!(
        worker,
        file = %job.file_name(),
        segment = job.segment_index(),
        start = seg.start,
        end = seg.end,
        "segment started"
    );

    match download_and_write(&job, opts) {
        Ok(()) => tracing::debug!(
            worker,
            file = %job.file_name(),
            segment = job.segment_index(),
            "segment done"
        ),
        Err(e) => {
            tracing::error!(
                worker,
                url = %job.url(),
                segment = job.segment_index(),
                start = seg.start,
                end = seg.end,
                "segment failed: {}",
                e
            );
            job.fail(e);
        }
    }
    job.finish();
}

/// Write only ever follows a successful fetch.
fn download_and_write(job: &DownloadJob, opts: &HttpOptions) -> Result<(), SegmentFailure> {
    let seg = job.segment();
    let bytes = http::fetch_segment(job.url(), &seg, opts)?;
    storage::write_segment(job.dest_path(), seg.start, &bytes)?;
    Ok(())
}
