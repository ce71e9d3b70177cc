use crate::supervisor::Connectivity;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tandem_core::IceCandidateInit;
use tokio::sync::mpsc;
use tracing::trace;

/// Handle to an incoming media stream. Opaque to the session; the embedding
/// application downcasts it to the engine's own track type.
#[derive(Clone)]
pub struct RemoteMedia(Arc<dyn Any + Send + Sync>);

impl RemoteMedia {
    pub fn new<T: Any + Send + Sync>(media: T) -> Self {
        Self(Arc::new(media))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for RemoteMedia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RemoteMedia(..)")
    }
}

#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A local ICE candidate to trickle to the peer.
    LocalCandidate(IceCandidateInit),
    Connectivity(Connectivity),
    RemoteMedia(RemoteMedia),
}

/// Where a transport reports its events.
///
/// Every event is tagged with the generation of the transport that produced
/// it, so the session can discard reports from connections it already
/// replaced.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
}

impl EventSink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, TransportEvent)>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, event: TransportEvent) {
        if self.tx.send((self.generation, event)).is_err() {
            trace!(generation = self.generation, "Session gone, transport event dropped");
        }
    }
}
