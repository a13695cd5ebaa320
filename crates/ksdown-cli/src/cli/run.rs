//! Process wiring: config, engine, intake sources, signals and the final report.

use anyhow::{Context, Result};
use ksdown_core::engine::{Engine, RunSummary};
use ksdown_core::intake::ACCEPTED_SCHEMES;
use ksdown_core::shutdown::{ShutdownSignal, TerminationController, DEFAULT_SIGNALS};
use ksdown_core::config;

use super::{links, Cli};

const USAGE_HINT: &str = "no links given; use -u <url,url,...> or -f <file with one link per line>";

/// Exit status after a termination signal, drained or not.
const EXIT_SIGNALLED: i32 = 1;

impl Cli {
    /// Runs the downloader and returns the process exit code.
    pub async fn run(self) -> Result<i32> {
        let mut cfg = config::load_or_init()?;
        self.apply_to(&mut cfg);
        cfg.validate().context("invalid configuration")?;
        tracing::debug!("effective config: {:?}", cfg);

        let links = links::collect(self.urls.as_deref(), self.file.as_deref())?;
        let watch_clipboard = self.watch_clipboard();
        if links.is_empty() {
            if !watch_clipboard {
                anyhow::bail!(USAGE_HINT);
            }
            tracing::warn!("{}; waiting for links on the clipboard", USAGE_HINT);
            eprintln!("ksdown: {}; waiting for links on the clipboard", USAGE_HINT);
        }

        let shutdown = ShutdownSignal::new();
        let signals = TerminationController::new(DEFAULT_SIGNALS, shutdown.clone())
            .arm()
            .context("failed to install signal handlers")?;

        let engine = Engine::new(&cfg, shutdown.clone())?;
        let summary = engine.summary();
        let intake = engine.intake();

        #[cfg(feature = "clipboard")]
        {
            if watch_clipboard {
                let _watcher = super::clipboard::spawn_watcher(
                    intake.clone(),
                    shutdown.clone(),
                    cfg.clipboard_poll_interval(),
                )?;
            }
        }

        let accepted = intake.add_task(&links);
        drop(intake);
        tracing::info!(
            accepted,
            given = links.len(),
            schemes = %ACCEPTED_SCHEMES.join(","),
            "links queued"
        );
        eprintln!(
            "ksdown: {} link(s) accepted, {} worker(s), saving to {}",
            accepted,
            cfg.workers,
            engine.download_dir().display()
        );

        let mut pool = tokio::task::spawn_blocking(move || engine.start_download());

        let (report, code) = tokio::select! {
            joined = &mut pool => {
                let report = joined.context("worker pool panicked")?;
                let code = if report.is_success() { 0 } else { 1 };
                (report, code)
            }
            sig = signals.wait() => {
                let grace = cfg.grace_period();
                eprintln!(
                    "ksdown: received {}, finishing in-flight segments (up to {}s)",
                    sig,
                    grace.as_secs()
                );
                let report = match tokio::time::timeout(grace, &mut pool).await {
                    Ok(joined) => {
                        tracing::info!("in-flight segments drained");
                        joined.context("worker pool panicked")?
                    }
                    Err(_) => {
                        tracing::warn!(grace_secs = grace.as_secs(), "grace period elapsed, forcing exit");
                        summary.snapshot()
                    }
                };
                (report, EXIT_SIGNALLED)
            }
        };

        print_report(&report);
        Ok(code)
    }
}

fn print_report(report: &RunSummary) {
    tracing::info!(
        complete = report.files_complete(),
        incomplete = report.files_incomplete(),
        failed_urls = report.failed_urls.len(),
        rejected = report.rejected_links.len(),
        "run finished"
    );
    print!("{}", report);
}
