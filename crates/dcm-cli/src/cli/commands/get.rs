//! `dcm get` – download URLs through the connection manager.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dcm_core::config::DcmConfig;
use dcm_core::event::RequestEvent;
use dcm_core::manager::ConnectionManager;
use dcm_core::request::{ConnectionRequest, RequestId};
use dcm_core::transport::curl::{CurlOptions, CurlTransport};

use crate::cli::dest;

const PROGRESS_INTERVAL_MS: u64 = 250;

pub async fn run_get(
    cfg: &DcmConfig,
    urls: Vec<String>,
    out: Option<PathBuf>,
    limit: Option<usize>,
    queue_limit: Option<usize>,
    delay: Option<f64>,
) -> Result<()> {
    let limit = limit.unwrap_or(cfg.max_active_requests);
    let queue_limit = queue_limit.unwrap_or(cfg.wait_queue_limit);
    let request_delay = delay
        .map(|secs| Duration::from_secs_f64(secs.max(0.0)))
        .unwrap_or_else(|| cfg.request_delay());
    let out_dir = match out.or_else(|| cfg.download_dir.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolve current directory")?,
    };

    let mut options = CurlOptions::default();
    if let Some(secs) = cfg.connect_timeout_secs {
        options.connect_timeout = Duration::from_secs(secs);
    }

    let manager = ConnectionManager::new(
        Arc::new(CurlTransport::new(options)),
        limit,
        queue_limit,
        request_delay,
    );
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let mut pending: HashMap<RequestId, Arc<ConnectionRequest>> = HashMap::new();
    for url in &urls {
        let datapath = out_dir.join(dest::filename_for_url(url));
        let request = ConnectionRequest::builder(url)
            .datapath(datapath)
            .events(tx.clone())
            .build();
        match manager.add(Arc::clone(&request)) {
            Ok(()) => {
                pending.insert(request.id(), request);
            }
            Err(err) => {
                tracing::warn!(url = %url, "rejected: {}", err);
                eprintln!("dcm: {}: {}", url, err);
            }
        }
    }
    drop(tx);

    let mut failed = 0usize;
    let mut last_print = Instant::now();
    while !pending.is_empty() {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    RequestEvent::Progress { id, downloaded, expected } => {
                        let now = Instant::now();
                        if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS {
                            print_progress(&pending, id, downloaded, expected);
                            last_print = now;
                        }
                    }
                    RequestEvent::Completed { id, result } => {
                        let Some(request) = pending.remove(&id) else { continue };
                        match result {
                            Ok(()) => write_completed(&request).await?,
                            Err(err) => {
                                failed += 1;
                                eprintln!("dcm: {}: {}", request.url(), err);
                            }
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\ninterrupted, cancelling transfers");
                manager.cancel_all();
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} download(s) failed", failed);
    }
    Ok(())
}

fn print_progress(
    pending: &HashMap<RequestId, Arc<ConnectionRequest>>,
    id: RequestId,
    downloaded: u64,
    expected: Option<u64>,
) {
    let Some(request) = pending.get(&id) else { return };
    let name = request
        .datapath()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| request.url().to_string());
    match expected {
        Some(total) if total > 0 => {
            let pct = downloaded as f64 / total as f64 * 100.0;
            println!("  {}  {} / {} bytes ({:.1}%)", name, downloaded, total, pct);
        }
        _ => println!("  {}  {} bytes", name, downloaded),
    }
}

async fn write_completed(request: &ConnectionRequest) -> Result<()> {
    let data = request.take_data();
    match request.datapath() {
        Some(path) => {
            tokio::fs::write(path, &data)
                .await
                .with_context(|| format!("write {}", path.display()))?;
            println!("{} -> {} ({} bytes)", request.url(), path.display(), data.len());
        }
        None => println!("{} ({} bytes, no destination)", request.url(), data.len()),
    }
    Ok(())
}
