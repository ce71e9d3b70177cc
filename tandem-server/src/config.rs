use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use tandem_core::IceServerConfig;
use tandem_core::utils::default_ice_servers;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_LIVENESS_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_OUTBOX_CAPACITY: usize = 128;
pub const DEFAULT_STATIC_DIR: &str = "public";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Directory served for every path that is not a signaling route.
    pub static_dir: PathBuf,
    pub liveness_interval: Duration,
    /// Per-connection outbound queue length; overflow is dropped.
    pub outbox_capacity: usize,
    pub ice_servers: Vec<IceServerConfig>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            liveness_interval: DEFAULT_LIVENESS_INTERVAL,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            ice_servers: default_ice_servers(),
        }
    }
}
