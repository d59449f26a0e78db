//! Download request entity: immutable descriptor plus runtime state.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

use crate::event::RequestEvent;

/// Opaque stable identity of a request. No two requests created in the same
/// process share an id, and a terminal id is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

impl RequestId {
    fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// Immutable description of one download: what to fetch and where the caller
/// intends to put it. `datapath` is a hint carried for the caller; the
/// manager itself never touches the filesystem.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub url: String,
    pub datapath: Option<PathBuf>,
}

/// One unit of download work tracked by the connection manager.
///
/// Response bytes accumulate in an internal buffer while the request is
/// active; the caller drains them with [`take_data`] after completion.
/// Lifecycle events go to the channel given at construction (see
/// [`RequestEvent`] for ordering and delivery guarantees).
///
/// [`take_data`]: ConnectionRequest::take_data
pub struct ConnectionRequest {
    id: RequestId,
    descriptor: RequestDescriptor,
    tag: Option<Box<dyn Any + Send + Sync>>,
    buffer: Mutex<Vec<u8>>,
    events: Option<UnboundedSender<RequestEvent>>,
    /// Set when the request is first admitted (started or queued). A request
    /// that reached a terminal state this way can never be tracked again,
    /// which keeps its completion event unique.
    admitted: AtomicBool,
}

impl ConnectionRequest {
    /// Start building a request for `url`.
    pub fn builder(url: impl Into<String>) -> ConnectionRequestBuilder {
        ConnectionRequestBuilder {
            url: url.into(),
            datapath: None,
            tag: None,
            events: None,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.descriptor.url
    }

    pub fn datapath(&self) -> Option<&Path> {
        self.descriptor.datapath.as_deref()
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Opaque caller-supplied tag, if any. Downcast with `Any::downcast_ref`.
    pub fn tag(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.tag.as_deref()
    }

    /// Number of bytes buffered so far.
    pub fn data_len(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    /// Drains and returns the buffered response bytes.
    pub fn take_data(&self) -> Vec<u8> {
        std::mem::take(&mut *self.buffer.lock().unwrap())
    }

    pub(crate) fn append_data(&self, chunk: &[u8]) {
        self.buffer.lock().unwrap().extend_from_slice(chunk);
    }

    /// Whether this request was ever admitted. Only meaningful under the
    /// manager lock.
    pub(crate) fn was_admitted(&self) -> bool {
        self.admitted.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_admitted(&self) {
        self.admitted.store(true, Ordering::Relaxed);
    }

    /// Delivers an event to the caller's channel. A dropped receiver means
    /// the caller opted out; the event is discarded.
    pub(crate) fn send_event(&self, event: RequestEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

impl fmt::Debug for ConnectionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRequest")
            .field("id", &self.id)
            .field("url", &self.descriptor.url)
            .field("datapath", &self.descriptor.datapath)
            .field("buffered", &self.data_len())
            .finish()
    }
}

/// Builder returned by [`ConnectionRequest::builder`].
pub struct ConnectionRequestBuilder {
    url: String,
    datapath: Option<PathBuf>,
    tag: Option<Box<dyn Any + Send + Sync>>,
    events: Option<UnboundedSender<RequestEvent>>,
}

impl ConnectionRequestBuilder {
    /// Destination path hint carried in the descriptor.
    pub fn datapath(mut self, path: impl Into<PathBuf>) -> Self {
        self.datapath = Some(path.into());
        self
    }

    /// Arbitrary opaque value for caller correlation.
    pub fn tag(mut self, tag: impl Any + Send + Sync) -> Self {
        self.tag = Some(Box::new(tag));
        self
    }

    /// Channel that receives this request's lifecycle events.
    pub fn events(mut self, tx: UnboundedSender<RequestEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// Finish building; assigns a fresh id.
    pub fn build(self) -> std::sync::Arc<ConnectionRequest> {
        std::sync::Arc::new(ConnectionRequest {
            id: RequestId::next(),
            descriptor: RequestDescriptor {
                url: self.url,
                datapath: self.datapath,
            },
            tag: self.tag,
            buffer: Mutex::new(Vec::new()),
            events: self.events,
            admitted: AtomicBool::new(false),
        })
    }
}
