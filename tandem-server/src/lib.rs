mod config;
mod error;
mod liveness;
mod room;
mod router;
mod signaling;

pub use config::*;
pub use error::*;
pub use liveness::*;
pub use room::*;
pub use router::*;
pub use signaling::*;
