//! Admission: admit now, queue, or reject.

use std::sync::Arc;
use std::time::Instant;

use crate::error::AdmissionError;
use crate::request::ConnectionRequest;

use super::state::{ActiveEntry, WaitingEntry};
use super::{ConnectionManager, Shared};

impl ConnectionManager {
    /// Submits `request` for download.
    ///
    /// `Ok(())` means admitted: the transfer either started immediately or
    /// the request was queued and will start once a slot frees and its delay
    /// elapses. Either way, the outcome arrives later on the request's event
    /// channel. `Err` means rejected outright: no transport was started and
    /// no event will ever be sent for this request.
    ///
    /// Never blocks on network I/O.
    pub fn add(&self, request: Arc<ConnectionRequest>) -> Result<(), AdmissionError> {
        let start_now = {
            let mut state = self.shared.state.lock().unwrap();
            // A request that was ever admitted stays rejected after it turns
            // terminal; its id must never re-enter the containers.
            if request.was_admitted() || state.is_tracked(request.id()) {
                return Err(AdmissionError::DuplicateRequest(request.id()));
            }
            if state.limit == 0 {
                return Err(AdmissionError::ActiveLimitExceeded);
            }
            // Immediate start only when no earlier arrival is waiting, so a
            // queued request's delay never lets a newcomer overtake it.
            if state.active.len() < state.limit && state.waiting.is_empty() {
                request.mark_admitted();
                state.active.push(ActiveEntry::new(Arc::clone(&request)));
                true
            } else if state.waiting.len() < state.wait_queue_limit {
                request.mark_admitted();
                let eligible_at = Instant::now() + state.request_delay;
                state.waiting.push_back(WaitingEntry {
                    request: Arc::clone(&request),
                    eligible_at,
                });
                false
            } else {
                tracing::debug!(id = %request.id(), url = %request.url(), "wait queue full, rejecting");
                return Err(AdmissionError::WaitQueueLimitExceeded {
                    limit: state.wait_queue_limit,
                });
            }
        };

        if start_now {
            tracing::debug!(id = %request.id(), url = %request.url(), "starting immediately");
            if !Shared::start_transport(&self.shared, request) {
                Shared::promote(&self.shared);
            }
        } else {
            tracing::debug!(id = %request.id(), url = %request.url(), "queued");
            // A slot may already be free (earlier arrivals still inside their
            // delay window); promotion schedules the re-check timer if so.
            Shared::promote(&self.shared);
        }

        Ok(())
    }
}
