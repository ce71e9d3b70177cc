mod connection_table;
mod signaling_output;
mod signaling_service;
mod ws_handler;

pub use connection_table::*;
pub use signaling_output::*;
pub use signaling_service::*;
pub use ws_handler::*;
