//! Client call session: one task that owns the peer transport, the
//! negotiator and the link supervisor, and reacts to signaling messages,
//! user actions and transport events in arrival order.

mod handle_signal_impl;
mod link_impl;
mod negotiate_impl;
mod session_config;

pub use session_config::{DEFAULT_GRACE_PERIOD, SessionConfig};

use crate::SessionError;
use crate::negotiation::{NegotiationState, Negotiator};
use crate::supervisor::{LinkState, LinkSupervisor};
use crate::transport::{PeerTransport, RemoteMedia, TransportEvent, TransportFactory};
use std::sync::Arc;
use tandem_core::SignalMessage;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info};

/// Everything the session reacts to besides its own transport.
#[derive(Debug)]
pub enum SessionInput {
    /// A message from the signaling server.
    Signal(SignalMessage),
    /// The call button: asks for a call when idle, hangs up during one.
    Call,
    HangUp,
    /// The signaling socket is gone; the session shuts down.
    SignalingClosed,
}

/// Notifications for whatever presents the call to the user.
#[derive(Debug, Clone)]
pub enum CallEvent {
    PeerJoined,
    ParticipantCount(usize),
    CallConnected,
    RemoteStream(RemoteMedia),
    CallEnded,
    RoomFull,
}

/// Snapshot published after every step of the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub negotiation: NegotiationState,
    pub link: LinkState,
    pub has_remote_description: bool,
    pub queued_candidates: usize,
    /// Incremented each time the peer transport is replaced.
    pub generation: u64,
}

/// Receiving ends handed to the embedding application.
pub struct SessionHandles {
    pub events: mpsc::UnboundedReceiver<CallEvent>,
    pub status: watch::Receiver<SessionStatus>,
}

pub struct Session {
    config: SessionConfig,
    factory: Arc<dyn TransportFactory>,
    transport: Option<Box<dyn PeerTransport>>,
    generation: u64,
    negotiator: Negotiator,
    supervisor: LinkSupervisor,
    outbound: mpsc::UnboundedSender<SignalMessage>,
    transport_tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
    transport_rx: mpsc::UnboundedReceiver<(u64, TransportEvent)>,
    call_events: mpsc::UnboundedSender<CallEvent>,
    status_tx: watch::Sender<SessionStatus>,
}

impl Session {
    /// `outbound` carries messages for the signaling server.
    pub fn new(
        config: SessionConfig,
        factory: Arc<dyn TransportFactory>,
        outbound: mpsc::UnboundedSender<SignalMessage>,
    ) -> (Self, SessionHandles) {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (call_events, events) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SessionStatus::default());
        let supervisor = LinkSupervisor::new(config.grace_period);

        let session = Self {
            config,
            factory,
            transport: None,
            generation: 0,
            negotiator: Negotiator::new(),
            supervisor,
            outbound,
            transport_tx,
            transport_rx,
            call_events,
            status_tx,
        };
        (session, SessionHandles { events, status })
    }

    /// Drives the session until signaling closes, the input side is dropped,
    /// or a fatal error occurs.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<SessionInput>) -> Result<(), SessionError> {
        self.install_transport().await?;
        self.publish_status();
        info!("Session started");

        let result = loop {
            let deadline = self.supervisor.deadline();

            let step = tokio::select! {
                input = inputs.recv() => match input {
                    Some(SessionInput::SignalingClosed) | None => break Ok(()),
                    Some(input) => self.handle_input(input).await,
                },
                Some((generation, event)) = self.transport_rx.recv() => {
                    self.handle_transport_event(generation, event).await
                }
                _ = grace_timer(deadline) => self.handle_grace_expiry().await,
            };

            if let Err(e) = step {
                break Err(e);
            }
            self.publish_status();
        };

        self.shutdown().await;
        info!("Session finished");
        result
    }

    async fn handle_input(&mut self, input: SessionInput) -> Result<(), SessionError> {
        match input {
            SessionInput::Signal(msg) => self.handle_signal(msg).await,
            SessionInput::Call if self.supervisor.call_in_progress() => self.hang_up().await,
            SessionInput::Call => {
                debug!("Requesting a call");
                self.send_signal(SignalMessage::RequestToCall);
                Ok(())
            }
            SessionInput::HangUp => self.hang_up().await,
            SessionInput::SignalingClosed => Ok(()),
        }
    }

    fn send_signal(&self, msg: SignalMessage) {
        debug!(kind = msg.kind(), "Sending signal");
        if self.outbound.send(msg).is_err() {
            debug!("Signaling writer gone, message dropped");
        }
    }

    fn notify(&self, event: CallEvent) {
        // Nobody listening is fine; the session runs headless too.
        let _ = self.call_events.send(event);
    }

    fn publish_status(&self) {
        let status = SessionStatus {
            negotiation: self.negotiator.state(),
            link: self.supervisor.state(),
            has_remote_description: self.negotiator.has_remote_description(),
            queued_candidates: self.negotiator.candidates().len(),
            generation: self.generation,
        };
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

async fn grace_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
