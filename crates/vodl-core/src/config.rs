use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Segment retry parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries per segment after the first failed attempt.
    pub max_retries: u32,
    /// Fixed delay in seconds between attempts.
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay_secs: 20,
        }
    }
}

/// Global configuration loaded from `~/.config/vodl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VodlConfig {
    /// Connection limit towards the platform CDN. One connection is kept
    /// in reserve, so segment workers = `max_connections - 1`.
    pub max_connections: usize,
    /// Root for per-job workspaces (None = system temp dir).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Safety-net interval of the promotion timer, in seconds.
    pub promote_interval_secs: u64,
    /// Upper bound on how long shutdown waits for running pipelines.
    pub shutdown_timeout_secs: u64,
    /// Remove jobs from the queue once they finish successfully.
    #[serde(default)]
    pub remove_completed: bool,
    /// ffmpeg executable used for conversion.
    pub ffmpeg_path: String,
}

impl Default for VodlConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            temp_dir: None,
            retry: None,
            promote_interval_secs: 2,
            shutdown_timeout_secs: 30,
            remove_completed: false,
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

impl VodlConfig {
    /// Segment worker count: the connection limit minus the reserved one.
    pub fn parallel_segments(&self) -> usize {
        self.max_connections.saturating_sub(1).max(1)
    }

    pub fn temp_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn promote_interval(&self) -> Duration {
        Duration::from_secs(self.promote_interval_secs.max(1))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vodl")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VodlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VodlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: VodlConfig = toml::from_str(&data)?;
    Ok(cfg)
}
