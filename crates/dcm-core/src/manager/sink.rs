//! Sink handed to the transport for one transfer. Routes bytes into the
//! request buffer and terminal outcomes back into the manager.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::DownloadError;
use crate::event::RequestEvent;
use crate::request::{ConnectionRequest, RequestId};

use super::Shared;

/// Per-transfer sink. The terminal methods ([`finish`], [`fail`],
/// [`aborted`]) consume the sink, so a transport reports at most one outcome
/// by construction; the manager additionally drops any outcome for a request
/// it no longer tracks.
///
/// [`finish`]: TransportSink::finish
/// [`fail`]: TransportSink::fail
/// [`aborted`]: TransportSink::aborted
pub struct TransportSink {
    shared: Arc<Shared>,
    request: Arc<ConnectionRequest>,
    downloaded: AtomicU64,
    /// Total size reported by the server; 0 means not reported.
    expected: AtomicU64,
}

impl TransportSink {
    pub(super) fn new(shared: Arc<Shared>, request: Arc<ConnectionRequest>) -> Self {
        Self {
            shared,
            request,
            downloaded: AtomicU64::new(0),
            expected: AtomicU64::new(0),
        }
    }

    /// The request this sink feeds.
    pub fn request_id(&self) -> RequestId {
        self.request.id()
    }

    /// Records the total transfer size once known (e.g. from Content-Length).
    pub fn set_expected(&self, total: u64) {
        self.expected.store(total, Ordering::Relaxed);
    }

    /// Appends a chunk to the request buffer and emits a progress event.
    /// The cumulative count is monotonically non-decreasing.
    pub fn data(&self, chunk: &[u8]) {
        self.request.append_data(chunk);
        let downloaded =
            self.downloaded.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
        let expected = match self.expected.load(Ordering::Relaxed) {
            0 => None,
            n => Some(n),
        };
        self.request.send_event(RequestEvent::Progress {
            id: self.request.id(),
            downloaded,
            expected,
        });
    }

    /// The transfer finished successfully.
    pub fn finish(self) {
        self.complete(Ok(()));
    }

    /// The transfer failed.
    pub fn fail(self, err: anyhow::Error) {
        self.complete(Err(DownloadError::Transport(err)));
    }

    /// The transfer stopped in response to an abort request.
    pub fn aborted(self) {
        self.complete(Err(DownloadError::Cancelled));
    }

    fn complete(self, result: Result<(), DownloadError>) {
        let id = self.request.id();
        let removed = {
            let mut state = self.shared.state.lock().unwrap();
            match state.active_index(id) {
                Some(i) => {
                    state.active.remove(i);
                    true
                }
                None => false,
            }
        };
        // Not tracked anymore: the outcome was already delivered elsewhere.
        if !removed {
            return;
        }

        match &result {
            Ok(()) => tracing::debug!(id = %id, bytes = self.downloaded.load(Ordering::Relaxed), "completed"),
            Err(err) => tracing::debug!(id = %id, "failed: {}", err),
        }
        self.request.send_event(RequestEvent::Completed { id, result });
        Shared::promote(&self.shared);
    }
}
