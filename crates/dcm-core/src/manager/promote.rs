//! Promotion: move waiting requests into free slots, honoring each request's
//! activation delay, and start their transfers.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crate::error::DownloadError;
use crate::event::RequestEvent;
use crate::request::ConnectionRequest;

use super::state::ActiveEntry;
use super::Shared;

impl Shared {
    /// Promotes waiting requests while a slot is free and an entry's delay
    /// has elapsed. Scans in arrival order and takes the first eligible
    /// entry, so a request still inside its delay window does not block a
    /// later eligible one. When only ineligible entries remain, schedules a
    /// re-check for the earliest deadline instead of polling.
    pub(super) fn promote(shared: &Arc<Shared>) {
        loop {
            let (request, recheck_at) = {
                let mut state = shared.state.lock().unwrap();
                if state.active.len() >= state.limit || state.waiting.is_empty() {
                    return;
                }
                let now = Instant::now();
                match state.waiting.iter().position(|w| w.eligible_at <= now) {
                    Some(i) => {
                        let entry = state.waiting.remove(i).expect("position is in bounds");
                        state
                            .active
                            .push(ActiveEntry::new(Arc::clone(&entry.request)));
                        (Some(entry.request), None)
                    }
                    None => {
                        let earliest = state.waiting.iter().map(|w| w.eligible_at).min();
                        (None, earliest)
                    }
                }
            };

            match request {
                Some(request) => {
                    tracing::debug!(id = %request.id(), url = %request.url(), "promoted from wait queue");
                    // Ignore a create failure here; the slot it frees is
                    // reconsidered on the next loop iteration.
                    let _ = Shared::start_transport(shared, request);
                }
                None => {
                    if let Some(deadline) = recheck_at {
                        Shared::schedule_recheck(shared, deadline);
                    }
                    return;
                }
            }
        }
    }

    /// Starts the transport for a request already placed in the active set.
    ///
    /// On creation failure the request is removed, completed with
    /// [`DownloadError::TransportCreate`], and `false` is returned so the
    /// caller can re-run promotion for the freed slot.
    pub(super) fn start_transport(shared: &Arc<Shared>, request: Arc<ConnectionRequest>) -> bool {
        let sink = super::sink::TransportSink::new(Arc::clone(shared), Arc::clone(&request));
        match shared.transport.start(request.descriptor(), sink) {
            Ok(handle) => {
                let abort_now = {
                    let mut state = shared.state.lock().unwrap();
                    match state.active_index(request.id()) {
                        Some(i) => {
                            let entry = &mut state.active[i];
                            entry.handle = Some(Arc::clone(&handle));
                            // Cancel arrived while the transport was starting.
                            entry.cancel_requested
                        }
                        // Completed before the handle landed; nothing to keep.
                        None => false,
                    }
                };
                if abort_now {
                    handle.abort();
                }
                true
            }
            Err(err) => {
                tracing::warn!(id = %request.id(), url = %request.url(), "transport create failed: {:#}", err);
                let removed = {
                    let mut state = shared.state.lock().unwrap();
                    match state.active_index(request.id()) {
                        Some(i) => {
                            state.active.remove(i);
                            true
                        }
                        None => false,
                    }
                };
                if removed {
                    request.send_event(RequestEvent::Completed {
                        id: request.id(),
                        result: Err(DownloadError::TransportCreate(err)),
                    });
                }
                false
            }
        }
    }

    /// Arranges for `promote` to run again at `deadline`. A single pending
    /// re-check suffices: entries are enqueued with non-decreasing deadlines,
    /// so an earlier-than-scheduled deadline cannot appear.
    fn schedule_recheck(shared: &Arc<Shared>, deadline: Instant) {
        {
            let mut state = shared.state.lock().unwrap();
            if matches!(state.recheck_at, Some(at) if at <= deadline) {
                return;
            }
            state.recheck_at = Some(deadline);
        }
        let shared = Arc::clone(shared);
        thread::spawn(move || {
            loop {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                thread::sleep(deadline - now);
            }
            {
                let mut state = shared.state.lock().unwrap();
                if state.recheck_at == Some(deadline) {
                    state.recheck_at = None;
                }
            }
            Shared::promote(&shared);
        });
    }
}
