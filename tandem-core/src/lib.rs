pub mod model;
pub mod utils;

mod error;

pub use error::SignalError;
pub use model::*;
