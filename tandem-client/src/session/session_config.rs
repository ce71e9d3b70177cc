use std::time::Duration;
use tandem_core::IceServerConfig;
use tandem_core::utils::default_ice_servers;

/// How long a dropped link may stay down before the call is abandoned.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub ice_servers: Vec<IceServerConfig>,
    pub grace_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: default_ice_servers(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}
