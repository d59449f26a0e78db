use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Global configuration loaded from `~/.config/dcm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcmConfig {
    /// Maximum number of requests downloading at once.
    pub max_active_requests: usize,
    /// Maximum number of requests held waiting for a free slot.
    pub wait_queue_limit: usize,
    /// Minimum time in seconds a queued request waits before it may start
    /// (0 = start as soon as a slot frees).
    pub request_delay_secs: f64,
    /// Optional directory for downloaded files (None = current directory).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Optional connect timeout override in seconds.
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl Default for DcmConfig {
    fn default() -> Self {
        Self {
            max_active_requests: 4,
            wait_queue_limit: 16,
            request_delay_secs: 0.0,
            download_dir: None,
            connect_timeout_secs: None,
        }
    }
}

impl DcmConfig {
    /// Request delay as a `Duration`. Negative values are treated as zero.
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay_secs.max(0.0))
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("dcm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DcmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DcmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: DcmConfig = toml::from_str(&data)?;
    Ok(cfg)
}
