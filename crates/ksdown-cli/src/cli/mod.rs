//! CLI for the ksdown segmented downloader.

mod clipboard;
mod links;
mod run;

use clap::Parser;
use ksdown_core::config::EngineConfig;
use std::path::PathBuf;

/// Top-level CLI: one flat set of flags, no subcommands.
#[derive(Debug, Parser)]
#[command(name = "ksdown")]
#[command(about = "Segmented HTTP downloader: splits each file into ranges fetched in parallel", long_about = None)]
#[command(after_help = "Examples:\n  ksdown -u http://cc.com/a.mp4,http://cc.com/b.mp4\n  ksdown -f ./urls.txt -g 20")]
pub struct Cli {
    /// Comma-separated links (http, https or thunder).
    #[arg(short = 'u', long = "urls", value_name = "URLS")]
    pub urls: Option<String>,

    /// File with one link per line (LF or CRLF).
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Worker count; also the number of segments per file [config default: 10].
    #[arg(short = 'g', long = "workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Directory downloads are written to [config default: ./download].
    #[arg(long, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Do not verify TLS certificates.
    #[arg(long)]
    pub insecure: bool,

    /// Do not watch the clipboard for new links; exit once the given links are done.
    #[arg(long)]
    pub no_clipboard: bool,

    /// Log to stderr instead of the log file.
    #[arg(long)]
    pub log_stderr: bool,
}

impl Cli {
    /// Applies flag overrides on top of the loaded config.
    pub fn apply_to(&self, cfg: &mut EngineConfig) {
        if let Some(n) = self.workers {
            cfg.workers = n;
        }
        if let Some(dir) = &self.download_dir {
            cfg.download_dir = dir.clone();
        }
        if self.insecure {
            cfg.insecure_tls = true;
        }
    }

    pub fn watch_clipboard(&self) -> bool {
        !self.no_clipboard && clipboard::AVAILABLE
    }
}

#[cfg(test)]
mod tests;
