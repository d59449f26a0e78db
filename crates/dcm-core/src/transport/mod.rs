//! Transport abstraction: anything that can stream bytes for one request.

pub mod curl;

use std::sync::Arc;

use crate::manager::TransportSink;
use crate::request::RequestDescriptor;

/// Handle onto one running transfer; lets the manager request an abort.
pub trait TransportHandle: Send + Sync {
    /// Asks the transfer to stop. Cooperative: the transfer acknowledges by
    /// calling [`TransportSink::aborted`], possibly after a short delay.
    /// Calling this on a transfer that already reported its outcome is a
    /// no-op.
    fn abort(&self);
}

/// Abstract byte-transfer mechanism the manager executes admitted requests
/// with.
///
/// `start` must not block on network I/O: it validates the descriptor,
/// spawns whatever performs the transfer, and returns a handle. Every
/// transfer outcome is reported through the sink; `start` itself only fails
/// when the transfer could not be created at all, which the manager surfaces
/// as [`DownloadError::TransportCreate`].
///
/// Implementations must support at least as many independent concurrent
/// transfers as the manager's active limit.
///
/// [`DownloadError::TransportCreate`]: crate::error::DownloadError::TransportCreate
pub trait Transport: Send + Sync {
    fn start(
        &self,
        descriptor: &RequestDescriptor,
        sink: TransportSink,
    ) -> anyhow::Result<Arc<dyn TransportHandle>>;
}
