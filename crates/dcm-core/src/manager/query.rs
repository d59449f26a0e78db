//! Read-only queries over tracked requests.

use std::sync::Arc;

use crate::request::{ConnectionRequest, RequestId};

use super::ConnectionManager;

impl ConnectionManager {
    /// True iff the request currently occupies an active slot.
    pub fn is_active(&self, request: &ConnectionRequest) -> bool {
        self.is_active_id(request.id())
    }

    /// [`is_active`](ConnectionManager::is_active) by id.
    pub fn is_active_id(&self, id: RequestId) -> bool {
        self.shared.state.lock().unwrap().active_index(id).is_some()
    }

    /// Returns the tracked requests for which `predicate` holds, in a fixed
    /// order: active requests (activation order) followed by waiting ones
    /// (arrival order).
    ///
    /// The predicate receives each request and a stop flag; setting the flag
    /// ends the scan after the current request. It runs over a point-in-time
    /// snapshot taken under the manager lock, so a concurrent add or cancel
    /// never produces a half-updated view, and the predicate itself may call
    /// back into the manager.
    pub fn requests_matching<F>(&self, mut predicate: F) -> Vec<Arc<ConnectionRequest>>
    where
        F: FnMut(&ConnectionRequest, &mut bool) -> bool,
    {
        let snapshot: Vec<Arc<ConnectionRequest>> = {
            let state = self.shared.state.lock().unwrap();
            state
                .active
                .iter()
                .map(|e| Arc::clone(&e.request))
                .chain(state.waiting.iter().map(|w| Arc::clone(&w.request)))
                .collect()
        };

        let mut matched = Vec::new();
        let mut stop = false;
        for request in snapshot {
            if predicate(&request, &mut stop) {
                matched.push(request);
            }
            if stop {
                break;
            }
        }
        matched
    }
}
