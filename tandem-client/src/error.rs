use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The room already had two participants.
    #[error("room is full")]
    RoomFull,

    #[error("failed to create peer transport: {0:#}")]
    Transport(#[from] anyhow::Error),

    #[error("signaling socket error: {0}")]
    Signaling(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid signaling server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
