//! curl-backed [`Transport`]: one blocking transfer thread per request.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;

use crate::manager::TransportSink;
use crate::request::RequestDescriptor;

use super::{Transport, TransportHandle};

/// Tuning knobs for curl transfers.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Abort when the transfer stays below this rate (bytes/sec)...
    pub low_speed_limit: u32,
    /// ...for this long.
    pub low_speed_time: Duration,
    pub max_redirections: u32,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            max_redirections: 10,
        }
    }
}

/// Transport that drives each transfer with a curl easy handle on a
/// dedicated thread. Abort is cooperative: the transfer's progress and write
/// callbacks check a shared flag and stop the transfer when it is set.
#[derive(Debug, Default)]
pub struct CurlTransport {
    options: CurlOptions,
}

impl CurlTransport {
    pub fn new(options: CurlOptions) -> Self {
        Self { options }
    }
}

struct CurlHandle {
    abort: Arc<AtomicBool>,
}

impl TransportHandle for CurlHandle {
    fn abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }
}

impl Transport for CurlTransport {
    fn start(
        &self,
        descriptor: &RequestDescriptor,
        sink: TransportSink,
    ) -> anyhow::Result<Arc<dyn TransportHandle>> {
        url::Url::parse(&descriptor.url)
            .with_context(|| format!("invalid URL: {}", descriptor.url))?;

        let mut easy = curl::easy::Easy::new();
        easy.url(&descriptor.url).context("set URL")?;
        easy.follow_location(true)?;
        easy.max_redirections(self.options.max_redirections)?;
        easy.connect_timeout(self.options.connect_timeout)?;
        easy.low_speed_limit(self.options.low_speed_limit)?;
        easy.low_speed_time(self.options.low_speed_time)?;
        easy.progress(true)?;

        let abort = Arc::new(AtomicBool::new(false));
        let token = Arc::clone(&abort);
        thread::spawn(move || run_transfer(easy, token, sink));

        Ok(Arc::new(CurlHandle { abort }))
    }
}

fn run_transfer(mut easy: curl::easy::Easy, abort: Arc<AtomicBool>, sink: TransportSink) {
    let result = {
        let mut transfer = easy.transfer();
        if let Err(e) = transfer.header_function(|line| {
            if let Some(len) = parse_content_length(line) {
                sink.set_expected(len);
            }
            true
        }) {
            drop(transfer);
            sink.fail(anyhow::Error::new(e).context("install header callback"));
            return;
        }
        if let Err(e) = transfer.write_function(|data| {
            if abort.load(Ordering::Relaxed) {
                return Ok(0); // abort transfer
            }
            sink.data(data);
            Ok(data.len())
        }) {
            drop(transfer);
            sink.fail(anyhow::Error::new(e).context("install write callback"));
            return;
        }
        if let Err(e) = transfer.progress_function(|_, _, _, _| !abort.load(Ordering::Relaxed)) {
            drop(transfer);
            sink.fail(anyhow::Error::new(e).context("install progress callback"));
            return;
        }
        transfer.perform()
    };

    if abort.load(Ordering::Relaxed) {
        sink.aborted();
        return;
    }

    match result {
        Ok(()) => match easy.response_code() {
            Ok(code) if (200..300).contains(&code) => sink.finish(),
            Ok(code) => sink.fail(anyhow::anyhow!("HTTP {}", code)),
            Err(e) => sink.fail(anyhow::Error::new(e).context("read response code")),
        },
        Err(e) => sink.fail(anyhow::Error::new(e).context("transfer failed")),
    }
}

/// Parses a `Content-Length` header line (case-insensitive). Redirect hops
/// each carry their own header block; the last value seen wins, which is the
/// final response's.
fn parse_content_length(line: &[u8]) -> Option<u64> {
    let line = std::str::from_utf8(line).ok()?;
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return None;
    }
    value.trim().parse().ok()
}
