//! Internal bookkeeping guarded by the manager mutex.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::request::{ConnectionRequest, RequestId};
use crate::transport::TransportHandle;

pub(super) struct ManagerState {
    pub limit: usize,
    pub wait_queue_limit: usize,
    pub request_delay: Duration,
    /// Active transfers in activation order.
    pub active: Vec<ActiveEntry>,
    /// Waiting requests in arrival order.
    pub waiting: VecDeque<WaitingEntry>,
    /// Deadline of the promotion re-check currently scheduled, if any.
    pub recheck_at: Option<Instant>,
}

pub(super) struct ActiveEntry {
    pub request: Arc<ConnectionRequest>,
    /// Set once the transport has produced a handle; `None` during the short
    /// window while the transport is being started.
    pub handle: Option<Arc<dyn TransportHandle>>,
    pub cancel_requested: bool,
}

pub(super) struct WaitingEntry {
    pub request: Arc<ConnectionRequest>,
    /// Earliest instant this request may be promoted.
    pub eligible_at: Instant,
}

impl ManagerState {
    pub fn new(limit: usize, wait_queue_limit: usize, request_delay: Duration) -> Self {
        Self {
            limit,
            wait_queue_limit,
            request_delay,
            active: Vec::new(),
            waiting: VecDeque::new(),
            recheck_at: None,
        }
    }

    pub fn is_tracked(&self, id: RequestId) -> bool {
        self.active_index(id).is_some() || self.waiting.iter().any(|w| w.request.id() == id)
    }

    pub fn active_index(&self, id: RequestId) -> Option<usize> {
        self.active.iter().position(|e| e.request.id() == id)
    }
}

impl ActiveEntry {
    pub fn new(request: Arc<ConnectionRequest>) -> Self {
        Self {
            request,
            handle: None,
            cancel_requested: false,
        }
    }
}
