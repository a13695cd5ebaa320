//! Download engine: bounded work queue, per-URL producers and a fixed worker pool.
//!
//! `Intake::add_task` validates links and spawns one producer thread per URL.
//! Producers resolve metadata, pre-size the destination and enqueue one
//! [`DownloadJob`] per segment; the queue holds at most `workers` jobs, so
//! producers block when it is full. `Engine::start_download` runs `workers`
//! threads that each take a job, fetch its range and write it at its offset.

mod job;
mod producer;
mod producers;
mod summary;
mod tracker;
mod worker;

pub use job::DownloadJob;
pub use summary::{FailedSegment, FileReport, RunSummary, SummaryHandle};
pub use tracker::FileTracker;

use anyhow::{Context as _, Result};
use crossbeam_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::http::HttpOptions;
use crate::intake;
use crate::shutdown::ShutdownSignal;
use producers::Producers;

/// How often blocked producers and idle workers re-check the shutdown flag.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long producers still waiting on metadata get after the pool stops.
const RESOLVE_GRACE: Duration = Duration::from_millis(500);

/// Failure reason for URLs that never reached partitioning because of shutdown.
pub(crate) const SKIPPED_BY_SHUTDOWN: &str = "skipped: shutdown requested before the download started";

/// Read-only state shared by producers and workers.
#[derive(Debug)]
pub(crate) struct Context {
    pub(crate) http: HttpOptions,
    pub(crate) workers: usize,
    pub(crate) download_dir: PathBuf,
    pub(crate) shutdown: ShutdownSignal,
    pub(crate) summary: SummaryHandle,
    pub(crate) producers: Producers,
}

/// The segmented download engine.
pub struct Engine {
    ctx: Arc<Context>,
    tx: Sender<DownloadJob>,
    rx: Receiver<DownloadJob>,
}

impl Engine {
    /// Validates `config`, creates the download directory and sets up the queue.
    pub fn new(config: &EngineConfig, shutdown: ShutdownSignal) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.download_dir).with_context(|| {
            format!(
                "failed to create download directory {}",
                config.download_dir.display()
            )
        })?;

        let (tx, rx) = crossbeam_channel::bounded(config.workers);
        let ctx = Arc::new(Context {
            http: HttpOptions::from(config),
            workers: config.workers,
            download_dir: config.download_dir.clone(),
            shutdown,
            summary: SummaryHandle::new(),
            producers: Producers::default(),
        });
        Ok(Self { ctx, tx, rx })
    }

    /// Handle for feeding links. The queue closes once every handle is dropped
    /// and every producer has finished.
    pub fn intake(&self) -> Intake {
        Intake {
            ctx: Arc::clone(&self.ctx),
            tx: self.tx.clone(),
        }
    }

    pub fn summary(&self) -> SummaryHandle {
        self.ctx.summary.clone()
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.ctx.shutdown.clone()
    }

    pub fn download_dir(&self) -> &Path {
        &self.ctx.download_dir
    }

    /// Runs the worker pool and blocks until the queue is closed and drained,
    /// or shutdown has been requested and in-flight segments have finished.
    ///
    /// Every accepted URL is in the returned summary. Jobs still queued at
    /// shutdown are reported as cancelled, and URLs still waiting on metadata
    /// after a short grace are reported as skipped.
    pub fn start_download(self) -> RunSummary {
        let Engine { ctx, tx, rx } = self;
        drop(tx);

        tracing::info!(workers = ctx.workers, "starting worker pool");
        let handles: Vec<_> = (0..ctx.workers)
            .filter_map(|id| {
                let rx = rx.clone();
                let ctx = Arc::clone(&ctx);
                std::thread::Builder::new()
                    .name(format!("ksdown-worker-{id}"))
                    .spawn(move || worker::run(id, rx, &ctx))
                    .map_err(|e| tracing::error!(worker = id, "failed to spawn worker: {}", e))
                    .ok()
            })
            .collect();
        if handles.is_empty() {
            tracing::error!("no worker could be started, stopping");
            ctx.shutdown.trigger();
        }

        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("worker panicked");
            }
        }

        let cancelled = settle_producers(&ctx, &rx);
        if cancelled > 0 {
            tracing::info!(cancelled, "discarded queued segments after shutdown");
        }

        tracing::info!("worker pool stopped");
        ctx.summary.snapshot()
    }
}

/// Waits until no producer can touch the queue or the summary any more,
/// cancelling queued jobs as they appear. Returns how many were cancelled.
fn settle_producers(ctx: &Context, rx: &Receiver<DownloadJob>) -> usize {
    let deadline = Instant::now() + RESOLVE_GRACE;
    let mut cancelled = 0;
    loop {
        for job in rx.try_iter() {
            job.cancel();
            cancelled += 1;
        }
        if ctx.producers.running() == 0 && ctx.producers.resolving() == 0 {
            return cancelled;
        }
        if Instant::now() >= deadline {
            for url in ctx.producers.abandon_resolving() {
                tracing::warn!(url = %url, "still resolving metadata at shutdown, skipped");
                ctx.summary.record_failed_url(&url, SKIPPED_BY_SHUTDOWN.to_string());
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Cloneable entry point for links (CLI flags, list files, clipboard).
#[derive(Clone)]
pub struct Intake {
    ctx: Arc<Context>,
    tx: Sender<DownloadJob>,
}

impl Intake {
    /// Validates each link and starts a producer for every accepted URL.
    /// Rejected links are logged and recorded; returns how many were accepted.
    pub fn add_task<I, S>(&self, links: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut accepted = 0;
        for raw in links {
            let raw = raw.as_ref();
            if self.ctx.shutdown.is_triggered() {
                tracing::warn!(link = raw, "shutdown in progress, link ignored");
                continue;
            }
            let url = match intake::resolve_link(raw) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(
                        link = raw,
                        "link rejected ({}): {}",
                        intake::ACCEPTED_SCHEMES.join(", "),
                        e
                    );
                    self.ctx.summary.record_rejected(raw, e.to_string());
                    continue;
                }
            };

            let ticket = self.ctx.producers.register(&url);
            let ctx = Arc::clone(&self.ctx);
            let tx = self.tx.clone();
            let spawned = std::thread::Builder::new()
                .name("ksdown-producer".to_string())
                .spawn({
                    let url = url.clone();
                    move || producer::produce(&ctx, &tx, ticket, url)
                });
            match spawned {
                Ok(_) => accepted += 1,
                Err(e) => {
                    tracing::error!(url = %url, "failed to spawn producer: {}", e);
                    if let Some(_running) = self.ctx.producers.claim(ticket) {
                        self.ctx.summary.record_failed_url(&url, e.to_string());
                    }
                }
            }
        }
        accepted
    }
}
