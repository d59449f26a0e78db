//! CLI for the DCM download connection manager.

mod commands;
mod dest;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dcm_core::config;
use std::path::PathBuf;

use commands::{run_config, run_get};

/// Top-level CLI for the DCM download connection manager.
#[derive(Debug, Parser)]
#[command(name = "dcm")]
#[command(about = "DCM: bounded-concurrency download manager", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download one or more URLs through the admission controller.
    Get {
        /// Direct HTTP/HTTPS URLs to download.
        #[arg(required = true)]
        urls: Vec<String>,

        /// Output directory (default: configured download_dir, else the
        /// current directory).
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        /// Max concurrent downloads (overrides config).
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Max downloads held waiting for a slot (overrides config).
        #[arg(long, value_name = "N")]
        queue_limit: Option<usize>,

        /// Seconds a queued download must wait before it may start
        /// (overrides config).
        #[arg(long, value_name = "SECS")]
        delay: Option<f64>,
    },

    /// Show the configuration file path and effective values.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                urls,
                out,
                limit,
                queue_limit,
                delay,
            } => run_get(&cfg, urls, out, limit, queue_limit, delay).await?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}
