use crate::SessionError;
use crate::session::{CallEvent, Session};
use crate::supervisor::Verdict;
use crate::transport::{EventSink, TransportEvent};
use tandem_core::{Payload, SignalMessage};
use tokio::time::Instant;
use tracing::{debug, info, warn};

impl Session {
    pub(crate) async fn handle_transport_event(
        &mut self,
        generation: u64,
        event: TransportEvent,
    ) -> Result<(), SessionError> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Event from a retired transport ignored");
            return Ok(());
        }

        match event {
            TransportEvent::LocalCandidate(candidate) => match Payload::from_typed(&candidate) {
                Ok(payload) => self.send_signal(SignalMessage::Candidate(payload)),
                Err(e) => warn!("Failed to encode local candidate: {}", e),
            },

            TransportEvent::RemoteMedia(media) => {
                info!("Remote stream attached");
                self.notify(CallEvent::RemoteStream(media));
            }

            TransportEvent::Connectivity(signal) => {
                debug!(?signal, "Connectivity changed");
                match self.supervisor.observe(signal, Instant::now()) {
                    Verdict::Established => self.notify(CallEvent::CallConnected),
                    Verdict::HangUp => self.hang_up().await?,
                    Verdict::GraceStarted { .. } | Verdict::Recovered | Verdict::Nothing => {}
                }
            }
        }

        Ok(())
    }

    pub(crate) async fn handle_grace_expiry(&mut self) -> Result<(), SessionError> {
        match self.supervisor.expire(Instant::now()) {
            Verdict::HangUp => self.hang_up().await,
            _ => Ok(()),
        }
    }

    /// Tells the peer the call is over, then starts afresh.
    pub(crate) async fn hang_up(&mut self) -> Result<(), SessionError> {
        info!("Hanging up");
        self.send_signal(SignalMessage::Hangup);
        self.reset_call().await
    }

    /// Drops the current call and installs a new transport for the next one.
    pub(crate) async fn reset_call(&mut self) -> Result<(), SessionError> {
        self.teardown().await;
        self.install_transport().await
    }

    pub(crate) async fn install_transport(&mut self) -> Result<(), SessionError> {
        self.generation += 1;
        let sink = EventSink::new(self.generation, self.transport_tx.clone());
        let transport = self
            .factory
            .create(&self.config.ice_servers, sink)
            .await?;
        self.transport = Some(transport);
        debug!(generation = self.generation, "Peer transport ready");
        Ok(())
    }

    pub(crate) async fn shutdown(&mut self) {
        if self.transport.is_some() {
            self.teardown().await;
        }
        self.publish_status();
    }

    async fn teardown(&mut self) {
        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("Failed to close peer transport: {:#}", e);
            }
        }
        self.negotiator.reset();
        self.supervisor.reset();
        self.notify(CallEvent::CallEnded);
    }
}
