use thiserror::Error;

/// Errors raised while decoding or interpreting signaling traffic.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("malformed signal message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("message has no offer, answer, candidate or type field")]
    Unrecognised,

    #[error("count message without a participant count")]
    MissingCount,

    #[error("payload does not have the expected shape: {0}")]
    InvalidPayload(#[source] serde_json::Error),

    #[error("room id must not be blank")]
    BlankRoomId,
}
