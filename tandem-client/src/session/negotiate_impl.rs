use crate::negotiation::Command;
use crate::session::Session;
use crate::transport::PeerTransport;
use anyhow::{Context, Result, anyhow};
use std::collections::VecDeque;
use tandem_core::SessionDescription;
use tracing::{debug, warn};

impl Session {
    /// Runs a negotiator command and everything it leads to, in order.
    pub(crate) async fn execute(&mut self, first: Command) {
        let mut pending = VecDeque::from([first]);

        while let Some(cmd) = pending.pop_front() {
            match cmd {
                Command::CreateOffer => match self.make_offer().await {
                    Ok(offer) => match self.negotiator.offer_created(&offer) {
                        Ok(next) => pending.push_back(next),
                        Err(e) => self.abort_negotiation(anyhow!(e)),
                    },
                    Err(e) => self.abort_negotiation(e),
                },

                Command::AcceptOffer(offer) => match self.make_answer(offer).await {
                    Ok(answer) => match self.negotiator.answer_created(&answer) {
                        Ok(next) => pending.extend(next),
                        Err(e) => self.abort_negotiation(anyhow!(e)),
                    },
                    Err(e) => self.abort_negotiation(e),
                },

                Command::ApplyAnswer(answer) => {
                    let applied = match self.transport() {
                        Ok(transport) => transport
                            .set_remote_description(answer)
                            .await
                            .context("applying remote answer"),
                        Err(e) => Err(e),
                    };
                    match applied {
                        Ok(()) => pending.push_back(self.negotiator.remote_answer_applied()),
                        Err(e) => self.abort_negotiation(e),
                    }
                }

                Command::Send(msg) => self.send_signal(msg),

                Command::AddCandidate(candidate) => {
                    if let Ok(transport) = self.transport() {
                        if let Err(e) = transport.add_ice_candidate(candidate).await {
                            warn!("Failed to apply remote ICE candidate: {:#}", e);
                        }
                    }
                }

                Command::FlushCandidates => {
                    if let Some(transport) = self.transport.as_deref() {
                        let applied = self.negotiator.candidates_mut().flush_into(transport).await;
                        debug!(applied, "Queued candidates flushed");
                    }
                }
            }
        }
    }

    async fn make_offer(&self) -> Result<SessionDescription> {
        let transport = self.transport()?;
        let offer = transport.create_offer().await.context("creating offer")?;
        transport
            .set_local_description(offer.clone())
            .await
            .context("setting local offer")?;
        Ok(offer)
    }

    async fn make_answer(&self, offer: SessionDescription) -> Result<SessionDescription> {
        let transport = self.transport()?;
        transport
            .set_remote_description(offer)
            .await
            .context("applying remote offer")?;
        let answer = transport.create_answer().await.context("creating answer")?;
        transport
            .set_local_description(answer.clone())
            .await
            .context("setting local answer")?;
        Ok(answer)
    }

    fn abort_negotiation(&mut self, error: anyhow::Error) {
        warn!("Negotiation step failed: {:#}", error);
        self.negotiator.negotiation_failed();
    }

    fn transport(&self) -> Result<&dyn PeerTransport> {
        self.transport
            .as_deref()
            .ok_or_else(|| anyhow!("no peer transport installed"))
    }
}
