//! Per-URL producer: metadata, partitioning, and enqueueing segment jobs.

use crossbeam_channel::{SendTimeoutError, Sender};
use std::sync::Arc;

use super::job::DownloadJob;
use super::tracker::FileTracker;
use super::{Context, POLL_INTERVAL, SKIPPED_BY_SHUTDOWN};
use crate::http;
use crate::segmenter::partition;
use crate::shutdown::ShutdownSignal;
use crate::storage;

/// Resolves `url`, pre-sizes its destination and enqueues one job per segment.
///
/// Blocks while the queue is full. On shutdown, segments not yet enqueued are
/// reported as cancelled so the file still gets a report. If the pool gave up
/// on `ticket` while metadata was pending, nothing is written or reported.
pub(super) fn produce(ctx: &Context, tx: &Sender<DownloadJob>, ticket: u64, url: String) {
    let meta = if ctx.shutdown.is_triggered() {
        None
    } else {
        tracing::info!(url = %url, "resolving file metadata");
        Some(http::resolve_metadata(&url, &ctx.http))
    };
    let Some(_running) = ctx.producers.claim(ticket) else {
        tracing::debug!(url = %url, "metadata arrived after shutdown, dropped");
        return;
    };
    let Some(meta) = meta.filter(|_| !ctx.shutdown.is_triggered()) else {
        tracing::info!(url = %url, "shutdown requested, download not started");
        ctx.summary.record_failed_url(&url, SKIPPED_BY_SHUTDOWN.to_string());
        return;
    };
    let meta = match meta {
        Ok(m) => m,
        Err(e) => {
            tracing::error!(url = %url, "failed to resolve metadata: {}", e);
            ctx.summary.record_failed_url(&url, e.to_string());
            return;
        }
    };

    let dest_path = ctx.download_dir.join(&meta.file_name);
    if ctx.summary.claim_path(&dest_path) > 0 {
        tracing::warn!(
            url = %url,
            path = %dest_path.display(),
            "another download is already writing to this path; the later one wins"
        );
    }

    if let Err(e) = storage::prepare_destination(&dest_path, meta.total_size) {
        tracing::error!(url = %url, "failed to prepare destination: {}", e);
        ctx.summary.release_path(&dest_path);
        ctx.summary.record_failed_url(&url, e.to_string());
        return;
    }

    let segments = partition(meta.total_size, ctx.workers);
    tracing::info!(
        file = %meta.file_name,
        size = meta.total_size,
        segments = segments.len(),
        "metadata resolved, enqueueing segments"
    );

    let tracker = Arc::new(FileTracker::new(
        meta.url,
        meta.file_name,
        dest_path,
        meta.total_size,
        segments.len(),
        ctx.summary.clone(),
    ));
    if segments.is_empty() {
        tracker.complete_empty();
        return;
    }

    let mut jobs = segments
        .into_iter()
        .enumerate()
        .map(|(i, seg)| DownloadJob::new(Arc::clone(&tracker), i, seg));

    while let Some(job) = jobs.next() {
        if let Err(job) = send_until_shutdown(tx, job, &ctx.shutdown) {
            tracing::debug!(file = %job.file_name(), "shutdown before all segments were queued");
            job.cancel();
            jobs.by_ref().for_each(DownloadJob::cancel);
            break;
        }
    }
}

/// Sends `job`, waiting for queue space while shutdown has not been requested.
/// Gives the job back if it could not be queued.
fn send_until_shutdown(
    tx: &Sender<DownloadJob>,
    mut job: DownloadJob,
    shutdown: &ShutdownSignal,
) -> Result<(), DownloadJob> {
    loop {
        if shutdown.is_triggered() {
            return Err(job);
        }
        match tx.send_timeout(job, POLL_INTERVAL) {
            Ok(()) => return Ok(()),
            Err(SendTimeoutError::Timeout(j)) => job = j,
            Err(SendTimeoutError::Disconnected(j)) => return Err(j),
        }
    }
}
