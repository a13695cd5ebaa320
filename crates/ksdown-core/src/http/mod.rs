//! HTTP plumbing over libcurl: shared handle setup, metadata resolution and
//! the segment fetcher.
//!
//! Every call here blocks the current thread; call from a worker thread or
//! `spawn_blocking` when used from async code.

mod fetch;
mod metadata;

pub use fetch::fetch_segment;
pub use metadata::{parse_status_line, resolve_metadata, FileMetadata};

use crate::config::EngineConfig;
use std::time::Duration;

/// Request settings applied to every curl handle the engine creates.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub user_agent: String,
    /// Skip TLS peer and host verification.
    pub insecure_tls: bool,
    pub connect_timeout: Duration,
    /// Hard wall-clock limit per request; `None` means unbounded.
    pub request_timeout: Option<Duration>,
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
}

impl From<&EngineConfig> for HttpOptions {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            user_agent: cfg.user_agent.clone(),
            insecure_tls: cfg.insecure_tls,
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            request_timeout: (cfg.request_timeout_secs > 0)
                .then(|| Duration::from_secs(cfg.request_timeout_secs)),
            low_speed_limit: cfg.low_speed_limit,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
        }
    }
}

impl Default for HttpOptions {
    fn default() -> Self {
        HttpOptions::from(&EngineConfig::default())
    }
}

impl HttpOptions {
    /// New GET handle for `url` with redirects, agent, TLS and timeout settings applied.
    pub(crate) fn handle(&self, url: &str) -> Result<curl::easy::Easy, curl::Error> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url)?;
        easy.get(true)?;
        easy.signal(false)?;
        easy.follow_location(true)?;
        easy.useragent(&self.user_agent)?;
        easy.connect_timeout(self.connect_timeout)?;
        if let Some(timeout) = self.request_timeout {
            easy.timeout(timeout)?;
        }
        if self.low_speed_limit > 0 {
            easy.low_speed_limit(self.low_speed_limit)?;
            easy.low_speed_time(self.low_speed_time)?;
        }
        if self.insecure_tls {
            easy.ssl_verify_peer(false)?;
            easy.ssl_verify_host(false)?;
        }
        Ok(easy)
    }
}
