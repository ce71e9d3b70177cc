use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Connectivity reported by the transport's ICE agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connectivity {
    New,
    Checking,
    Connected,
    Completed,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Pending,
    Connected,
    /// Lost the link at `since`; waiting out the grace period.
    Disconnected {
        since: Instant,
    },
    Failed,
    Closed,
}

/// What the session has to do after a connectivity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Nothing,
    /// First time the link came up for this connection.
    Established,
    GraceStarted {
        deadline: Instant,
    },
    Recovered,
    /// Give up on the call: tell the peer and reset.
    HangUp,
}

/// Watches one connection's link and decides when a drop is final.
///
/// A transient disconnect gets `grace` to recover. Failure, or a disconnect
/// that outlasts the grace period, yields a single [`Verdict::HangUp`]; after
/// that the supervisor stays quiet until [`reset`](Self::reset).
#[derive(Debug)]
pub struct LinkSupervisor {
    state: LinkState,
    grace: Duration,
}

impl LinkSupervisor {
    pub fn new(grace: Duration) -> Self {
        Self {
            state: LinkState::Pending,
            grace,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Whether the call button should act as hang-up.
    pub fn call_in_progress(&self) -> bool {
        matches!(
            self.state,
            LinkState::Connected | LinkState::Disconnected { .. }
        )
    }

    /// When the running grace timer fires, if one is running.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            LinkState::Disconnected { since } => Some(since + self.grace),
            _ => None,
        }
    }

    pub fn observe(&mut self, signal: Connectivity, now: Instant) -> Verdict {
        if matches!(self.state, LinkState::Failed | LinkState::Closed) {
            return Verdict::Nothing;
        }

        match signal {
            Connectivity::Connected | Connectivity::Completed => match self.state {
                LinkState::Pending => {
                    self.state = LinkState::Connected;
                    info!("Peer link established");
                    Verdict::Established
                }
                LinkState::Disconnected { since } => {
                    self.state = LinkState::Connected;
                    info!(after = ?now.duration_since(since), "Peer link recovered");
                    Verdict::Recovered
                }
                _ => Verdict::Nothing,
            },

            Connectivity::Disconnected => match self.state {
                LinkState::Disconnected { .. } => Verdict::Nothing,
                _ => {
                    self.state = LinkState::Disconnected { since: now };
                    let deadline = now + self.grace;
                    warn!(grace = ?self.grace, "Peer link lost, waiting for it to recover");
                    Verdict::GraceStarted { deadline }
                }
            },

            Connectivity::Failed => {
                self.state = LinkState::Failed;
                warn!("Peer link failed");
                Verdict::HangUp
            }

            Connectivity::Closed => {
                self.state = LinkState::Closed;
                Verdict::Nothing
            }

            Connectivity::New | Connectivity::Checking => Verdict::Nothing,
        }
    }

    /// Called when the grace timer fires.
    pub fn expire(&mut self, now: Instant) -> Verdict {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.state = LinkState::Failed;
                warn!("Peer link did not recover within the grace period");
                Verdict::HangUp
            }
            _ => Verdict::Nothing,
        }
    }

    pub fn reset(&mut self) {
        self.state = LinkState::Pending;
    }
}
