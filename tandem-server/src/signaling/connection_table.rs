use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_core::{ConnectionId, SignalMessage};
use tokio::sync::{Notify, mpsc};
use tracing::{debug, warn};

/// What the socket writer task is asked to put on the wire.
#[derive(Debug, Clone)]
pub enum Outbound {
    Signal(SignalMessage),
    Relay(Arc<str>),
    Ping,
    Close,
}

/// Per-socket state shared between its handler and the liveness monitor.
pub struct ConnectionHandle {
    outbox: mpsc::Sender<Outbound>,
    alive: AtomicBool,
    kill: Notify,
}

impl ConnectionHandle {
    /// Record that the peer answered since the last probe.
    pub fn mark_alive(&self) {
        self.alive.store(true, Ordering::Release);
    }

    /// Resolves once the liveness monitor has evicted this connection.
    pub async fn killed(&self) {
        self.kill.notified().await
    }

    fn push(&self, conn: &ConnectionId, msg: Outbound) -> bool {
        match self.outbox.try_send(msg) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(msg)) => {
                warn!(%conn, ?msg, "Outbound queue full, dropping message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(%conn, "Outbound queue closed");
                false
            }
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub probed: usize,
    pub evicted: usize,
}

/// All open signaling sockets, keyed by connection id.
#[derive(Default)]
pub struct ConnectionTable {
    connections: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        conn: ConnectionId,
        outbox: mpsc::Sender<Outbound>,
    ) -> Arc<ConnectionHandle> {
        let handle = Arc::new(ConnectionHandle {
            outbox,
            alive: AtomicBool::new(true),
            kill: Notify::new(),
        });
        self.connections.insert(conn, handle.clone());
        handle
    }

    pub fn unregister(&self, conn: &ConnectionId) {
        self.connections.remove(conn);
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn push(&self, conn: &ConnectionId, msg: Outbound) -> bool {
        match self.connections.get(conn) {
            Some(handle) => handle.push(conn, msg),
            None => {
                debug!(%conn, "Dropping message for a closed connection");
                false
            }
        }
    }

    /// One liveness tick: evict whoever ignored the previous probe, probe the rest.
    pub fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for entry in self.connections.iter() {
            let (conn, handle) = entry.pair();
            if handle.alive.swap(false, Ordering::AcqRel) {
                handle.push(conn, Outbound::Ping);
                report.probed += 1;
            } else {
                warn!(%conn, "No answer to liveness probe, evicting");
                handle.kill.notify_one();
                report.evicted += 1;
            }
        }

        report
    }
}

impl SignalingOutput for ConnectionTable {
    fn send_signal(&self, conn: &ConnectionId, msg: SignalMessage) {
        self.push(conn, Outbound::Signal(msg));
    }

    fn forward(&self, conn: &ConnectionId, raw: Arc<str>) {
        self.push(conn, Outbound::Relay(raw));
    }

    fn close(&self, conn: &ConnectionId) {
        self.push(conn, Outbound::Close);
    }
}
