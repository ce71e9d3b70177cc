use crate::room::room_command::{JoinOutcome, RoomCommand};
use crate::room::room_manager::RoomHandle;
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use std::sync::Arc;
use tandem_core::{ConnectionId, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Maximum number of members a room admits.
pub const ROOM_CAPACITY: usize = 2;

/// One actor per room. Owns the member list; nothing else touches it.
pub struct Room {
    id: RoomId,
    generation: u64,
    members: Vec<ConnectionId>,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
    registry: Arc<DashMap<RoomId, RoomHandle>>,
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        generation: u64,
        command_rx: mpsc::Receiver<RoomCommand>,
        signaling: Arc<dyn SignalingOutput>,
        registry: Arc<DashMap<RoomId, RoomHandle>>,
    ) -> Self {
        Self {
            id,
            generation,
            members: Vec::with_capacity(ROOM_CAPACITY),
            command_rx,
            signaling,
            registry,
        }
    }

    pub async fn run(mut self) {
        info!(room = %self.id, "Room event loop started");

        while let Some(cmd) = self.command_rx.recv().await {
            if self.handle_command(cmd) {
                self.retire().await;
                break;
            }
        }

        info!(room = %self.id, "Room event loop finished");
    }

    /// Returns true once the last member has left.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join { conn, reply } => {
                let outcome = self.join(conn);
                if reply.send(outcome).is_err() {
                    debug!(room = %self.id, %conn, "Joiner went away before the outcome arrived");
                }
                false
            }

            RoomCommand::Leave { conn } => self.leave(conn),

            RoomCommand::Relay { from, message, raw } => {
                self.relay(from, message, raw);
                false
            }
        }
    }

    fn join(&mut self, conn: ConnectionId) -> JoinOutcome {
        if self.members.contains(&conn) {
            warn!(room = %self.id, %conn, "Duplicate join ignored");
            return JoinOutcome::Admitted;
        }

        if self.members.len() >= ROOM_CAPACITY {
            info!(room = %self.id, %conn, "Room full, rejecting connection");
            self.signaling.send_signal(&conn, SignalMessage::RoomFull);
            self.signaling.close(&conn);
            return JoinOutcome::Rejected;
        }

        self.members.push(conn);
        info!(room = %self.id, %conn, members = self.members.len(), "Connection joined room");

        if let [existing, joiner] = self.members.as_slice() {
            // The newcomer always initiates, so both sides never offer at once.
            self.signaling.send_signal(joiner, SignalMessage::CreateOffer);
            self.signaling.send_signal(existing, SignalMessage::PeerJoined);
        }

        self.broadcast_count();
        JoinOutcome::Admitted
    }

    fn leave(&mut self, conn: ConnectionId) -> bool {
        let Some(index) = self.members.iter().position(|m| *m == conn) else {
            debug!(room = %self.id, %conn, "Leave from a non-member ignored");
            return false;
        };

        self.members.remove(index);
        info!(room = %self.id, %conn, members = self.members.len(), "Connection left room");

        self.broadcast_count();
        self.members.is_empty()
    }

    fn relay(&self, from: ConnectionId, message: SignalMessage, raw: Arc<str>) {
        if !self.members.contains(&from) {
            warn!(room = %self.id, %from, "Relay from a non-member dropped");
            return;
        }

        if message == SignalMessage::RequestToCall {
            debug!(room = %self.id, %from, "Manual call request, directing sender to offer");
            self.signaling.send_signal(&from, SignalMessage::CreateOffer);
        } else if message.is_relayable() {
            for peer in self.members.iter().filter(|m| **m != from) {
                self.signaling.forward(peer, raw.clone());
            }
        } else if message.is_server_directive() {
            warn!(
                room = %self.id,
                %from,
                kind = message.kind(),
                "Client sent a server-only message, dropping"
            );
        }
    }

    fn broadcast_count(&self) {
        let count = self.members.len();
        for member in &self.members {
            self.signaling
                .send_signal(member, SignalMessage::ParticipantCount(count));
        }
    }

    /// Removes this room from the registry and drains whatever was queued.
    ///
    /// Joins drained here are never answered; the joiner sees its reply
    /// channel close and retries against a fresh room.
    async fn retire(&mut self) {
        let generation = self.generation;
        self.registry
            .remove_if(&self.id, |_, handle| handle.generation == generation);
        self.command_rx.close();

        let mut orphaned = 0usize;
        while let Some(cmd) = self.command_rx.recv().await {
            if matches!(cmd, RoomCommand::Join { .. }) {
                orphaned += 1;
            }
        }

        info!(room = %self.id, orphaned, "Room emptied and removed");
    }
}
