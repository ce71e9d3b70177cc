use crate::ServerError;
use crate::room::{JoinOutcome, Room, RoomCommand};
use crate::signaling::SignalingOutput;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tandem_core::{ConnectionId, RoomId, SignalMessage};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

const ROOM_COMMAND_CAPACITY: usize = 100;
const MAX_JOIN_ATTEMPTS: usize = 8;

/// Registry entry pointing at a live room actor.
#[derive(Clone)]
pub struct RoomHandle {
    pub(crate) generation: u64,
    tx: mpsc::Sender<RoomCommand>,
}

/// Room Registry: maps room ids to their actors and spawns them on demand.
#[derive(Clone)]
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    signaling: Arc<dyn SignalingOutput>,
    next_generation: Arc<AtomicU64>,
}

impl RoomManager {
    pub fn new(signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            signaling,
            next_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id)
    }

    fn get_room_sender(&self, room_id: &RoomId) -> RoomHandle {
        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                info!(room = %room_id, generation, "Creating new room");

                let (tx, rx) = mpsc::channel(ROOM_COMMAND_CAPACITY);
                let room = Room::new(
                    room_id.clone(),
                    generation,
                    rx,
                    self.signaling.clone(),
                    self.rooms.clone(),
                );
                tokio::spawn(room.run());

                RoomHandle { generation, tx }
            })
            .clone()
    }

    fn existing_room(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|handle| handle.clone())
    }

    /// Asks the room for a seat, creating the room if needed.
    ///
    /// A room that retires while the request is queued never answers it;
    /// in that case the request is replayed against a new room.
    pub async fn join(
        &self,
        room_id: &RoomId,
        conn: ConnectionId,
    ) -> Result<JoinOutcome, ServerError> {
        for attempt in 1..=MAX_JOIN_ATTEMPTS {
            let handle = self.get_room_sender(room_id);
            let (reply, outcome) = oneshot::channel();

            if handle
                .tx
                .send(RoomCommand::Join { conn, reply })
                .await
                .is_err()
            {
                let generation = handle.generation;
                self.rooms
                    .remove_if(room_id, |_, h| h.generation == generation);
                debug!(room = %room_id, attempt, "Room actor gone, retrying join");
                continue;
            }

            match outcome.await {
                Ok(outcome) => return Ok(outcome),
                Err(_) => debug!(room = %room_id, attempt, "Room retired during join, retrying"),
            }
        }

        warn!(room = %room_id, %conn, "Giving up on join");
        Err(ServerError::RoomUnavailable(room_id.clone()))
    }

    pub async fn leave(&self, room_id: &RoomId, conn: ConnectionId) {
        let Some(handle) = self.existing_room(room_id) else {
            return;
        };
        if handle.tx.send(RoomCommand::Leave { conn }).await.is_err() {
            debug!(room = %room_id, %conn, "Room already retired");
        }
    }

    pub async fn relay(
        &self,
        room_id: &RoomId,
        from: ConnectionId,
        message: SignalMessage,
        raw: Arc<str>,
    ) {
        let Some(handle) = self.existing_room(room_id) else {
            warn!(room = %room_id, %from, "Relay for an unknown room dropped");
            return;
        };
        let cmd = RoomCommand::Relay { from, message, raw };
        if handle.tx.send(cmd).await.is_err() {
            debug!(room = %room_id, %from, "Room already retired, relay dropped");
        }
    }
}
