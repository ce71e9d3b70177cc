//! Seam between the session driver and whatever peer-connection engine
//! actually moves media.

#[cfg(feature = "native")]
mod connection_wrapper;
mod transport_event;

#[cfg(feature = "native")]
pub use connection_wrapper::{RtcTransport, RtcTransportFactory};
pub use transport_event::{EventSink, RemoteMedia, TransportEvent};

use anyhow::Result;
use async_trait::async_trait;
use tandem_core::{IceCandidateInit, IceServerConfig, SessionDescription};

/// One peer connection. Dropped and replaced on every call reset.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidateInit) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds a fresh transport wired to report into `events`.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(
        &self,
        ice_servers: &[IceServerConfig],
        events: EventSink,
    ) -> Result<Box<dyn PeerTransport>>;
}
