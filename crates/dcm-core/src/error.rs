//! Error taxonomy: synchronous admission failures and terminal download outcomes.

use thiserror::Error;

use crate::request::RequestId;

/// Failure returned synchronously from [`ConnectionManager::add`].
///
/// A rejected request never starts transport and never produces a completion
/// event; the `add` result is the caller's only signal.
///
/// [`ConnectionManager::add`]: crate::manager::ConnectionManager::add
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdmissionError {
    /// The request is already tracked (active or waiting).
    #[error("{0} is already tracked")]
    DuplicateRequest(RequestId),
    /// The active limit is zero: no slot can ever open, so queueing would
    /// strand the request. Rejected up front instead.
    #[error("active limit is zero, request can never start")]
    ActiveLimitExceeded,
    /// All active slots are taken and the wait queue is full.
    #[error("wait queue full ({limit} waiting)")]
    WaitQueueLimitExceeded {
        /// The wait queue limit in effect when the request was rejected.
        limit: usize,
    },
}

/// Terminal failure delivered through [`RequestEvent::Completed`] for a
/// request that was admitted (started or queued).
///
/// [`RequestEvent::Completed`]: crate::event::RequestEvent::Completed
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The request was cancelled, either while waiting or after a transport
    /// abort was acknowledged.
    #[error("cancelled")]
    Cancelled,
    /// The transport could not be instantiated for an admitted request.
    #[error("transport create failed: {0}")]
    TransportCreate(#[source] anyhow::Error),
    /// The transport started but failed (network error, non-2xx status, ...).
    #[error("transport failed: {0}")]
    Transport(#[source] anyhow::Error),
}

impl DownloadError {
    /// True for the cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }
}
