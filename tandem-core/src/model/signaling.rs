use crate::SignalError;
use crate::model::payload::Payload;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Every message that travels over the signaling socket.
///
/// On the wire the variant is implied by which fields are present, e.g.
/// `{"offer": {...}}` or `{"type": "count", "count": 2}`. Only JSON objects
/// decode; arrays and scalars are malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "WireMessage")]
pub enum SignalMessage {
    Offer(Payload),
    Answer(Payload),
    Candidate(Payload),
    RequestToCall,
    CreateOffer,
    PeerJoined,
    RoomFull,
    ParticipantCount(usize),
    Hangup,
}

impl SignalMessage {
    pub fn decode(text: &str) -> Result<Self, SignalError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, SignalError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Messages the relay forwards verbatim to the other room member.
    pub fn is_relayable(&self) -> bool {
        matches!(
            self,
            Self::Offer(_) | Self::Answer(_) | Self::Candidate(_) | Self::Hangup
        )
    }

    /// Messages only the server may originate.
    pub fn is_server_directive(&self) -> bool {
        matches!(
            self,
            Self::CreateOffer | Self::PeerJoined | Self::RoomFull | Self::ParticipantCount(_)
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::Candidate(_) => "candidate",
            Self::RequestToCall => "request-to-call",
            Self::CreateOffer => "create-offer",
            Self::PeerJoined => "peer-joined",
            Self::RoomFull => "room-full",
            Self::ParticipantCount(_) => "count",
            Self::Hangup => "hangup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum WireKind {
    CreateOffer,
    PeerJoined,
    RoomFull,
    Count,
    RequestToCall,
    Hangup,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireMessage {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<WireKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    offer: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    candidate: Option<Payload>,
}

impl TryFrom<Map<String, Value>> for SignalMessage {
    type Error = SignalError;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        // A derived struct visitor also takes sequences, so go through the map.
        let wire: WireMessage = serde_json::from_value(Value::Object(fields))?;
        Self::try_from(wire)
    }
}

impl TryFrom<WireMessage> for SignalMessage {
    type Error = SignalError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        if let Some(kind) = wire.kind {
            return Ok(match kind {
                WireKind::CreateOffer => Self::CreateOffer,
                WireKind::PeerJoined => Self::PeerJoined,
                WireKind::RoomFull => Self::RoomFull,
                WireKind::RequestToCall => Self::RequestToCall,
                WireKind::Hangup => Self::Hangup,
                WireKind::Count => {
                    Self::ParticipantCount(wire.count.ok_or(SignalError::MissingCount)?)
                }
            });
        }

        if let Some(offer) = wire.offer {
            Ok(Self::Offer(offer))
        } else if let Some(answer) = wire.answer {
            Ok(Self::Answer(answer))
        } else if let Some(candidate) = wire.candidate {
            Ok(Self::Candidate(candidate))
        } else {
            Err(SignalError::Unrecognised)
        }
    }
}

impl From<SignalMessage> for WireMessage {
    fn from(msg: SignalMessage) -> Self {
        let kind = |kind| Self {
            kind: Some(kind),
            ..Self::default()
        };

        match msg {
            SignalMessage::Offer(offer) => Self {
                offer: Some(offer),
                ..Self::default()
            },
            SignalMessage::Answer(answer) => Self {
                answer: Some(answer),
                ..Self::default()
            },
            SignalMessage::Candidate(candidate) => Self {
                candidate: Some(candidate),
                ..Self::default()
            },
            SignalMessage::RequestToCall => kind(WireKind::RequestToCall),
            SignalMessage::CreateOffer => kind(WireKind::CreateOffer),
            SignalMessage::PeerJoined => kind(WireKind::PeerJoined),
            SignalMessage::RoomFull => kind(WireKind::RoomFull),
            SignalMessage::Hangup => kind(WireKind::Hangup),
            SignalMessage::ParticipantCount(n) => Self {
                kind: Some(WireKind::Count),
                count: Some(n),
                ..Self::default()
            },
        }
    }
}
