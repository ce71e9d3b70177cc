use crate::SessionError;
use crate::session::{CallEvent, Session};
use tandem_core::{IceCandidateInit, SdpType, SessionDescription, SignalMessage};
use tracing::{debug, info, warn};

impl Session {
    pub(crate) async fn handle_signal(&mut self, msg: SignalMessage) -> Result<(), SessionError> {
        debug!(kind = msg.kind(), "Signal received");

        match msg {
            SignalMessage::CreateOffer => {
                if let Some(cmd) = self.negotiator.begin_offer() {
                    self.execute(cmd).await;
                }
            }

            SignalMessage::Offer(payload) => match payload.decode::<SessionDescription>() {
                Ok(desc) if desc.sdp_type == SdpType::Offer => {
                    if let Some(cmd) = self.negotiator.on_remote_offer(desc) {
                        self.execute(cmd).await;
                    }
                }
                Ok(desc) => warn!(sdp_type = ?desc.sdp_type, "Offer message without an offer, dropping"),
                Err(e) => warn!("Dropping undecodable offer: {}", e),
            },

            SignalMessage::Answer(payload) => match payload.decode::<SessionDescription>() {
                Ok(desc) if desc.sdp_type == SdpType::Answer => {
                    if let Some(cmd) = self.negotiator.on_remote_answer(desc) {
                        self.execute(cmd).await;
                    }
                }
                Ok(desc) => warn!(sdp_type = ?desc.sdp_type, "Answer message without an answer, dropping"),
                Err(e) => warn!("Dropping undecodable answer: {}", e),
            },

            SignalMessage::Candidate(payload) => match payload.decode::<IceCandidateInit>() {
                Ok(candidate) => {
                    if let Some(cmd) = self.negotiator.on_remote_candidate(candidate) {
                        self.execute(cmd).await;
                    }
                }
                Err(e) => warn!("Dropping undecodable candidate: {}", e),
            },

            SignalMessage::PeerJoined => {
                info!("Peer joined the room");
                self.notify(CallEvent::PeerJoined);
            }

            SignalMessage::ParticipantCount(count) => {
                debug!(count, "Participant count changed");
                self.notify(CallEvent::ParticipantCount(count));
            }

            SignalMessage::RoomFull => {
                warn!("Room is full");
                self.notify(CallEvent::RoomFull);
                return Err(SessionError::RoomFull);
            }

            SignalMessage::Hangup => {
                info!("Peer hung up");
                self.reset_call().await?;
            }

            SignalMessage::RequestToCall => {
                warn!("Server echoed a call request, ignoring");
            }
        }

        Ok(())
    }
}
