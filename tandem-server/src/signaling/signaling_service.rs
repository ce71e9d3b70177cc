use crate::ServerConfig;
use crate::room::RoomManager;
use crate::signaling::ConnectionTable;
use std::sync::Arc;
use tandem_core::IceServerConfig;

struct SignalingInner {
    connections: Arc<ConnectionTable>,
    ice_servers: Vec<IceServerConfig>,
    outbox_capacity: usize,
}

/// Shared state handed to every socket handler.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
    rooms: RoomManager,
}

impl SignalingService {
    pub fn new(config: &ServerConfig) -> Self {
        let connections = Arc::new(ConnectionTable::new());
        let rooms = RoomManager::new(connections.clone());

        Self {
            inner: Arc::new(SignalingInner {
                connections,
                ice_servers: config.ice_servers.clone(),
                outbox_capacity: config.outbox_capacity.max(1),
            }),
            rooms,
        }
    }

    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }

    pub fn connections(&self) -> &Arc<ConnectionTable> {
        &self.inner.connections
    }

    pub fn get_ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn outbox_capacity(&self) -> usize {
        self.inner.outbox_capacity
    }
}
