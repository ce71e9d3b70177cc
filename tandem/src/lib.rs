pub use tandem_core::{RoomId, SignalError, SignalMessage};

pub mod model {
    pub use tandem_core::model::*;
    pub use tandem_core::utils::default_ice_servers;
}

#[cfg(feature = "server")]
pub mod server {
    pub use tandem_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use tandem_client::*;
}
