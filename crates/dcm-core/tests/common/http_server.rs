//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body per server. A gated server sends the response
//! headers immediately but holds the body back until the gate is opened,
//! which lets tests pin a transfer in the active state.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Starts a server that answers every request with `status` and `body`.
/// Returns the base URL (e.g. "http://127.0.0.1:12345/").
pub fn start(status: u32, body: Vec<u8>) -> String {
    let (url, gate) = start_gated(status, body);
    gate.store(true, Ordering::Relaxed);
    url
}

/// Like `start`, but the body is withheld until the returned gate is set to
/// true. Headers (including Content-Length) are sent right away.
pub fn start_gated(status: u32, body: Vec<u8>) -> (String, Arc<AtomicBool>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let gate = Arc::new(AtomicBool::new(false));
    let gate_srv = Arc::clone(&gate);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let gate = Arc::clone(&gate_srv);
            thread::spawn(move || handle(stream, status, &body, &gate));
        }
    });
    (format!("http://127.0.0.1:{}/", port), gate)
}

fn handle(mut stream: std::net::TcpStream, status: u32, body: &[u8], gate: &AtomicBool) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }

    let reason = match status {
        200 => "OK",
        404 => "Not Found",
        _ => "Error",
    };
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        body.len()
    );
    if stream.write_all(header.as_bytes()).is_err() {
        return;
    }
    let _ = stream.flush();

    // Hold the body until the gate opens (capped so a leaked connection
    // cannot wedge the test binary).
    let deadline = Instant::now() + Duration::from_secs(10);
    while !gate.load(Ordering::Relaxed) && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }

    let _ = stream.write_all(body);
    let _ = stream.flush();
}
