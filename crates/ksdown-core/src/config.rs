use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Firefox 57 on macOS; some hosts refuse range requests from unknown agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.12; rv:57.0) Gecko/20100101 Firefox/57.0";

/// Engine configuration loaded from `~/.config/ksdown/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker pool size. Also the number of segments per file and the work queue capacity.
    pub workers: usize,
    /// Directory downloads are written to, created if absent.
    pub download_dir: PathBuf,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Skip TLS peer and host verification.
    pub insecure_tls: bool,
    pub connect_timeout_secs: u64,
    /// Hard per-request timeout. `0` disables it.
    pub request_timeout_secs: u64,
    /// Abort a transfer slower than `low_speed_limit` bytes/s for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    /// How long in-flight segments may run after a termination signal.
    pub grace_period_secs: u64,
    /// Clipboard polling interval in milliseconds.
    pub clipboard_poll_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            download_dir: PathBuf::from("download"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            insecure_tls: false,
            connect_timeout_secs: 30,
            request_timeout_secs: 3600,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            grace_period_secs: 5,
            clipboard_poll_ms: 1000,
        }
    }
}

impl EngineConfig {
    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            anyhow::bail!("workers must be at least 1");
        }
        if self.user_agent.trim().is_empty() {
            anyhow::bail!("user_agent must not be empty");
        }
        Ok(())
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn clipboard_poll_interval(&self) -> Duration {
        Duration::from_millis(self.clipboard_poll_ms.max(1))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ksdown")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<EngineConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = EngineConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)
            .with_context(|| format!("failed to write default config {}", path.display()))?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.workers, 10);
        assert_eq!(cfg.download_dir, PathBuf::from("download"));
        assert!(!cfg.insecure_tls);
        assert_eq!(cfg.user_agent, DEFAULT_USER_AGENT);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = EngineConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml = r#"
            workers = 4
            insecure_tls = true
        "#;
        let cfg: EngineConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.workers, 4);
        assert!(cfg.insecure_tls);
        assert_eq!(cfg.connect_timeout_secs, 30);
        assert_eq!(cfg.grace_period(), Duration::from_secs(5));
    }

    #[test]
    fn zero_workers_rejected() {
        let cfg = EngineConfig {
            workers: 0,
            ..EngineConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
