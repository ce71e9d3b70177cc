use crate::candidate_queue::CandidateQueue;
use tandem_core::{IceCandidateInit, Payload, SessionDescription, SignalError, SignalMessage};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NegotiationState {
    #[default]
    Idle,
    Negotiating(Role),
    Stable,
}

/// Work the session driver has to carry out on the transport or the socket.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a local offer, set it locally, then report back via
    /// [`Negotiator::offer_created`].
    CreateOffer,
    /// Apply the remote offer, create and set an answer, then report back via
    /// [`Negotiator::answer_created`].
    AcceptOffer(SessionDescription),
    /// Apply the remote answer, then report back via
    /// [`Negotiator::remote_answer_applied`].
    ApplyAnswer(SessionDescription),
    Send(SignalMessage),
    AddCandidate(IceCandidateInit),
    FlushCandidates,
}

/// Offer/answer state machine for one peer connection.
///
/// Pure bookkeeping: it never touches the transport, it only tells the driver
/// what to do next. The driver feeds results back in, one at a time.
#[derive(Debug, Default)]
pub struct Negotiator {
    state: NegotiationState,
    has_remote_description: bool,
    candidates: CandidateQueue,
}

impl Negotiator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn has_remote_description(&self) -> bool {
        self.has_remote_description
    }

    pub fn candidates(&self) -> &CandidateQueue {
        &self.candidates
    }

    pub fn candidates_mut(&mut self) -> &mut CandidateQueue {
        &mut self.candidates
    }

    /// Server told us to initiate. Ignored while another round is in flight.
    pub fn begin_offer(&mut self) -> Option<Command> {
        if let NegotiationState::Negotiating(role) = self.state {
            warn!(?role, "Already negotiating, ignoring request to offer");
            return None;
        }
        self.state = NegotiationState::Negotiating(Role::Offerer);
        debug!("Creating offer");
        Some(Command::CreateOffer)
    }

    pub fn offer_created(&self, offer: &SessionDescription) -> Result<Command, SignalError> {
        Ok(Command::Send(SignalMessage::Offer(Payload::from_typed(offer)?)))
    }

    /// A remote offer arrived. Dropped outright while we are mid-negotiation,
    /// so the first round to start is the one that finishes.
    pub fn on_remote_offer(&mut self, offer: SessionDescription) -> Option<Command> {
        if let NegotiationState::Negotiating(role) = self.state {
            warn!(?role, "Remote offer arrived mid-negotiation, dropping it");
            return None;
        }
        self.state = NegotiationState::Negotiating(Role::Answerer);
        debug!("Answering remote offer");
        Some(Command::AcceptOffer(offer))
    }

    pub fn answer_created(&mut self, answer: &SessionDescription) -> Result<Vec<Command>, SignalError> {
        let reply = SignalMessage::Answer(Payload::from_typed(answer)?);
        self.state = NegotiationState::Stable;
        self.has_remote_description = true;
        info!("Negotiation complete (answerer)");
        Ok(vec![Command::Send(reply), Command::FlushCandidates])
    }

    /// A remote answer arrived. Only meaningful while we are the offerer.
    pub fn on_remote_answer(&mut self, answer: SessionDescription) -> Option<Command> {
        if self.state != NegotiationState::Negotiating(Role::Offerer) {
            warn!(state = ?self.state, "Answer arrived in the wrong state, ignoring it");
            return None;
        }
        self.state = NegotiationState::Stable;
        info!("Negotiation complete (offerer)");
        Some(Command::ApplyAnswer(answer))
    }

    pub fn remote_answer_applied(&mut self) -> Command {
        self.has_remote_description = true;
        Command::FlushCandidates
    }

    /// A remote candidate arrived. Applied at once if the remote description
    /// is in place, queued otherwise.
    pub fn on_remote_candidate(&mut self, candidate: IceCandidateInit) -> Option<Command> {
        if self.has_remote_description {
            Some(Command::AddCandidate(candidate))
        } else {
            self.candidates.enqueue(candidate);
            None
        }
    }

    /// A transport step failed. Falls back to the last settled state so a
    /// later directive can start a new round.
    pub fn negotiation_failed(&mut self) {
        self.state = if self.has_remote_description {
            NegotiationState::Stable
        } else {
            NegotiationState::Idle
        };
        warn!(state = ?self.state, "Negotiation failed");
    }

    pub fn reset(&mut self) {
        self.state = NegotiationState::Idle;
        self.has_remote_description = false;
        self.candidates.clear();
    }
}
