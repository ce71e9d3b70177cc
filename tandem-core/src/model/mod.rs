mod connection;
mod payload;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use payload::{IceCandidateInit, Payload, SdpType, SessionDescription};
pub use room::RoomId;
pub use signaling::{IceServerConfig, SignalMessage};
