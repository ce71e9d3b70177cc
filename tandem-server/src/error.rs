use tandem_core::RoomId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind signaling listener: {0}")]
    Bind(#[source] std::io::Error),

    #[error("signaling server stopped: {0}")]
    Serve(#[source] std::io::Error),

    #[error("room {0} kept retiring while a join was in flight")]
    RoomUnavailable(RoomId),
}
