use crate::IceServerConfig;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_TURN_ADDR: &str = "turn:openrelay.metered.ca:80";
pub const DEFAULT_TURN_USERNAME: &str = "openrelayproject";
pub const DEFAULT_TURN_CREDENTIAL: &str = "openrelayproject";

/// Public STUN plus the free openrelay TURN relay.
pub fn default_ice_servers() -> Vec<IceServerConfig> {
    vec![
        IceServerConfig {
            urls: vec![DEFAULT_STUN_ADDR.to_string()],
            username: None,
            credential: None,
        },
        IceServerConfig {
            urls: vec![DEFAULT_TURN_ADDR.to_string()],
            username: Some(DEFAULT_TURN_USERNAME.to_string()),
            credential: Some(DEFAULT_TURN_CREDENTIAL.to_string()),
        },
    ]
}
