//! Request lifecycle events delivered to the caller.
//!
//! Instead of completion/progress callbacks, the manager reports through an
//! event channel the caller attaches to each request
//! ([`ConnectionRequest::builder`]). Events are sent from manager and
//! transport threads, never while the manager's internal lock is held, so a
//! receiver is free to call back into the manager.
//!
//! [`ConnectionRequest::builder`]: crate::request::ConnectionRequest::builder

use crate::error::DownloadError;
use crate::request::RequestId;

/// One lifecycle event for a tracked request.
#[derive(Debug)]
pub enum RequestEvent {
    /// Bytes arrived for an active request.
    ///
    /// `downloaded` is cumulative and non-decreasing over the request's
    /// lifetime; `expected` is the total size once the server reported one.
    /// All progress events for a request precede its `Completed` event.
    Progress {
        id: RequestId,
        downloaded: u64,
        expected: Option<u64>,
    },
    /// Terminal outcome, sent exactly once per admitted request.
    ///
    /// Requests rejected synchronously by `add` never produce this event.
    Completed {
        id: RequestId,
        result: Result<(), DownloadError>,
    },
}

impl RequestEvent {
    /// The request this event belongs to.
    pub fn id(&self) -> RequestId {
        match self {
            RequestEvent::Progress { id, .. } => *id,
            RequestEvent::Completed { id, .. } => *id,
        }
    }
}
