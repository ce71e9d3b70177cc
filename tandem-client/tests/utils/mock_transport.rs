use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tandem_client::Connectivity;
use tandem_client::transport::{EventSink, PeerTransport, TransportEvent, TransportFactory};
use tandem_core::{IceCandidateInit, IceServerConfig, SdpType, SessionDescription};

/// One call made on a mock transport, tagged with its generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    CreateOffer,
    CreateAnswer,
    SetLocal(SdpType),
    SetRemote(SdpType),
    AddCandidate(String),
    Close,
}

#[derive(Default)]
struct FactoryState {
    calls: Mutex<Vec<(u64, TransportCall)>>,
    sinks: Mutex<Vec<EventSink>>,
    fail_offers: AtomicBool,
    trickle: AtomicBool,
}

/// Factory for in-memory transports that record every call.
///
/// With trickle enabled, setting a local description emits one local
/// candidate, like a real ICE agent would.
#[derive(Clone, Default)]
pub struct MockFactory {
    state: Arc<FactoryState>,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trickle() -> Self {
        let factory = Self::default();
        factory.state.trickle.store(true, Ordering::SeqCst);
        factory
    }

    pub fn fail_offers(&self, fail: bool) {
        self.state.fail_offers.store(fail, Ordering::SeqCst);
    }

    pub fn created(&self) -> usize {
        self.state.sinks.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(u64, TransportCall)> {
        self.state.calls.lock().unwrap().clone()
    }

    /// Calls made on the transport of the given generation.
    pub fn calls_for(&self, generation: u64) -> Vec<TransportCall> {
        self.calls()
            .into_iter()
            .filter(|(g, _)| *g == generation)
            .map(|(_, call)| call)
            .collect()
    }

    pub fn sink(&self, generation: u64) -> EventSink {
        self.state
            .sinks
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.generation() == generation)
            .cloned()
            .expect("no transport with that generation")
    }

    pub fn latest_sink(&self) -> EventSink {
        self.state
            .sinks
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no transport created yet")
    }

    /// Report a connectivity change from the newest transport.
    pub fn emit_connectivity(&self, connectivity: Connectivity) {
        self.latest_sink()
            .emit(TransportEvent::Connectivity(connectivity));
    }
}

#[async_trait]
impl TransportFactory for MockFactory {
    async fn create(
        &self,
        _ice_servers: &[IceServerConfig],
        events: EventSink,
    ) -> Result<Box<dyn PeerTransport>> {
        self.state.sinks.lock().unwrap().push(events.clone());
        Ok(Box::new(MockTransport {
            state: self.state.clone(),
            events,
        }))
    }
}

pub struct MockTransport {
    state: Arc<FactoryState>,
    events: EventSink,
}

impl MockTransport {
    fn record(&self, call: TransportCall) {
        self.state
            .calls
            .lock()
            .unwrap()
            .push((self.events.generation(), call));
    }
}

#[async_trait]
impl PeerTransport for MockTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(TransportCall::CreateOffer);
        if self.state.fail_offers.load(Ordering::SeqCst) {
            bail!("offer creation failed");
        }
        Ok(SessionDescription::offer(format!(
            "v=0\r\no=- {} 1 IN IP4 127.0.0.1\r\n",
            self.events.generation()
        )))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record(TransportCall::CreateAnswer);
        Ok(SessionDescription::answer(format!(
            "v=0\r\no=- {} 2 IN IP4 127.0.0.1\r\n",
            self.events.generation()
        )))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(TransportCall::SetLocal(desc.sdp_type));
        if self.state.trickle.load(Ordering::SeqCst) {
            self.events.emit(TransportEvent::LocalCandidate(candidate(&format!(
                "candidate:{} 1 udp 2122260223 127.0.0.1 50000 typ host",
                self.events.generation()
            ))));
        }
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(TransportCall::SetRemote(desc.sdp_type));
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidateInit) -> Result<()> {
        self.record(TransportCall::AddCandidate(candidate.candidate));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record(TransportCall::Close);
        Ok(())
    }
}

pub fn candidate(line: &str) -> IceCandidateInit {
    IceCandidateInit {
        candidate: line.to_string(),
        sdp_mid: Some("0".into()),
        sdp_m_line_index: Some(0),
        username_fragment: None,
    }
}
