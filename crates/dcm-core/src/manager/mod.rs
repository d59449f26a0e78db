//! Bounded-concurrency admission control for download requests.
//!
//! The manager owns the active set and the FIFO wait queue, enforces the
//! active limit and wait-queue limit, applies the per-request activation
//! delay, and routes transport outcomes back to the caller as events.
//! Bookkeeping lives under a single mutex; transport work never runs inside
//! it, and events are never sent with it held.

mod admit;
mod cancel;
mod promote;
mod query;
mod sink;
mod state;


pub use sink::TransportSink;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::DcmConfig;
use crate::transport::Transport;

use state::ManagerState;

/// Admission controller for download requests.
///
/// Cheap to clone; clones share the same state and transport.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

pub(crate) struct Shared {
    transport: Arc<dyn Transport>,
    state: Mutex<ManagerState>,
}

impl ConnectionManager {
    /// Creates a manager over `transport` with up to `limit` concurrent
    /// transfers, up to `wait_queue_limit` queued requests, and a minimum
    /// `request_delay` between a request entering the queue and starting.
    pub fn new(
        transport: Arc<dyn Transport>,
        limit: usize,
        wait_queue_limit: usize,
        request_delay: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                state: Mutex::new(ManagerState::new(limit, wait_queue_limit, request_delay)),
            }),
        }
    }

    /// Creates a manager with the admission settings from `cfg`.
    pub fn from_config(cfg: &DcmConfig, transport: Arc<dyn Transport>) -> Self {
        Self::new(
            transport,
            cfg.max_active_requests,
            cfg.wait_queue_limit,
            cfg.request_delay(),
        )
    }

    /// Max simultaneous active transfers.
    pub fn limit(&self) -> usize {
        self.shared.state.lock().unwrap().limit
    }

    /// Changes the active limit. An increase promotes waiting requests; a
    /// decrease only affects future admission and never preempts transfers
    /// that are already running.
    pub fn set_limit(&self, limit: usize) {
        let promote = {
            let mut state = self.shared.state.lock().unwrap();
            let grew = limit > state.limit;
            state.limit = limit;
            grew
        };
        if promote {
            Shared::promote(&self.shared);
        }
    }

    /// Max queued-but-not-active requests accepted by `add`.
    pub fn wait_queue_limit(&self) -> usize {
        self.shared.state.lock().unwrap().wait_queue_limit
    }

    /// Changes the wait-queue limit. Checked on admission only; requests
    /// already waiting are kept even if the new limit is smaller.
    pub fn set_wait_queue_limit(&self, wait_queue_limit: usize) {
        self.shared.state.lock().unwrap().wait_queue_limit = wait_queue_limit;
    }

    /// Minimum time a queued request waits before it may start.
    pub fn request_delay(&self) -> Duration {
        self.shared.state.lock().unwrap().request_delay
    }

    /// Number of currently active transfers.
    pub fn active_count(&self) -> usize {
        self.shared.state.lock().unwrap().active.len()
    }

    /// Number of requests waiting for a slot.
    pub fn waiting_count(&self) -> usize {
        self.shared.state.lock().unwrap().waiting.len()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock().unwrap();
        f.debug_struct("ConnectionManager")
            .field("limit", &state.limit)
            .field("wait_queue_limit", &state.wait_queue_limit)
            .field("request_delay", &state.request_delay)
            .field("active", &state.active.len())
            .field("waiting", &state.waiting.len())
            .finish()
    }
}
