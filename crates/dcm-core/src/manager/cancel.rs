//! Cancellation of individual requests and of everything at once.

use std::sync::Arc;

use crate::error::DownloadError;
use crate::event::RequestEvent;
use crate::request::{ConnectionRequest, RequestId};
use crate::transport::TransportHandle;

use super::ConnectionManager;

enum CancelAction {
    /// Active: ask the transport to stop; the request stays active until the
    /// abort is acknowledged through the sink.
    Abort(Arc<dyn TransportHandle>),
    /// Active, but the transport handle has not landed yet; the start path
    /// sees the flag and aborts as soon as it has the handle.
    Flagged,
    /// Waiting: removed immediately, completed here.
    Dequeued(Arc<ConnectionRequest>),
    /// Unknown or already terminal.
    None,
}

impl ConnectionManager {
    /// Cancels one request. Active transfers are aborted cooperatively and
    /// complete with [`DownloadError::Cancelled`] once the transport
    /// acknowledges; waiting requests are removed and completed immediately.
    /// Cancelling an untracked (terminal or never-added) request is a no-op.
    pub fn cancel(&self, request: &ConnectionRequest) {
        self.cancel_id(request.id());
    }

    /// [`cancel`](ConnectionManager::cancel) by id.
    pub fn cancel_id(&self, id: RequestId) {
        let action = {
            let mut state = self.shared.state.lock().unwrap();
            if let Some(i) = state.active_index(id) {
                let entry = &mut state.active[i];
                entry.cancel_requested = true;
                match &entry.handle {
                    Some(handle) => CancelAction::Abort(Arc::clone(handle)),
                    None => CancelAction::Flagged,
                }
            } else if let Some(i) = state.waiting.iter().position(|w| w.request.id() == id) {
                let entry = state.waiting.remove(i).expect("position is in bounds");
                CancelAction::Dequeued(entry.request)
            } else {
                CancelAction::None
            }
        };

        match action {
            CancelAction::Abort(handle) => {
                tracing::debug!(id = %id, "abort requested");
                handle.abort();
            }
            CancelAction::Flagged => {
                tracing::debug!(id = %id, "cancel noted, transport still starting");
            }
            CancelAction::Dequeued(request) => {
                tracing::debug!(id = %id, "cancelled while waiting");
                request.send_event(RequestEvent::Completed {
                    id,
                    result: Err(DownloadError::Cancelled),
                });
            }
            CancelAction::None => {}
        }
    }

    /// Cancels every active and waiting request. Waiting requests complete
    /// with [`DownloadError::Cancelled`] right away; active transfers are
    /// aborted and complete once the transport acknowledges. A completion
    /// racing this call is delivered at most once: whichever path removes
    /// the entry first wins.
    pub fn cancel_all(&self) {
        let (handles, dequeued) = {
            let mut state = self.shared.state.lock().unwrap();
            let mut handles = Vec::new();
            for entry in &mut state.active {
                entry.cancel_requested = true;
                if let Some(handle) = &entry.handle {
                    handles.push(Arc::clone(handle));
                }
            }
            let dequeued: Vec<_> = state.waiting.drain(..).map(|w| w.request).collect();
            (handles, dequeued)
        };

        tracing::debug!(
            aborting = handles.len(),
            dequeued = dequeued.len(),
            "cancelling all requests"
        );
        for handle in handles {
            handle.abort();
        }
        for request in dequeued {
            request.send_event(RequestEvent::Completed {
                id: request.id(),
                result: Err(DownloadError::Cancelled),
            });
        }
    }
}
