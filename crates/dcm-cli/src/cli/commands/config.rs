//! `dcm config` – show the configuration file path and effective values.

use anyhow::Result;
use dcm_core::config::{self, DcmConfig};

pub fn run_config(cfg: &DcmConfig) -> Result<()> {
    println!("config file: {}", config::config_path()?.display());
    println!("max_active_requests = {}", cfg.max_active_requests);
    println!("wait_queue_limit = {}", cfg.wait_queue_limit);
    println!("request_delay_secs = {}", cfg.request_delay_secs);
    match &cfg.download_dir {
        Some(dir) => println!("download_dir = {}", dir.display()),
        None => println!("download_dir = (current directory)"),
    }
    match cfg.connect_timeout_secs {
        Some(secs) => println!("connect_timeout_secs = {}", secs),
        None => println!("connect_timeout_secs = (default)"),
    }
    Ok(())
}
