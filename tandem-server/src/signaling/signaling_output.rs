use std::sync::Arc;
use tandem_core::{ConnectionId, SignalMessage};

/// Outbound side of the signaling sockets as seen by a room.
///
/// Every call is fire-and-forget: implementations must never block the
/// room actor, dropping the message instead when a peer cannot keep up.
pub trait SignalingOutput: Send + Sync {
    /// Send a message the server itself originates.
    fn send_signal(&self, conn: &ConnectionId, msg: SignalMessage);

    /// Forward a peer's message exactly as it was received.
    fn forward(&self, conn: &ConnectionId, raw: Arc<str>);

    /// Flush what is queued for the connection, then close it.
    fn close(&self, conn: &ConnectionId);
}
