use std::sync::Arc;
use tandem_core::{ConnectionId, SignalMessage};
use tokio::sync::oneshot;

/// Commands delivered to a room actor by the socket handlers.
#[derive(Debug)]
pub enum RoomCommand {
    /// A freshly opened socket asks for a seat.
    Join {
        conn: ConnectionId,
        reply: oneshot::Sender<JoinOutcome>,
    },

    /// The socket closed or was evicted.
    Leave { conn: ConnectionId },

    /// A decoded message from a member; `raw` is the exact text it sent.
    Relay {
        from: ConnectionId,
        message: SignalMessage,
        raw: Arc<str>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Admitted,
    Rejected,
}
