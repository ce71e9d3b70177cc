mod candidate_queue;
mod error;
mod negotiation;
mod session;
mod signaling;
mod supervisor;
pub mod transport;

pub use candidate_queue::CandidateQueue;
pub use error::SessionError;
pub use negotiation::{Command, NegotiationState, Negotiator, Role};
pub use session::*;
pub use signaling::*;
pub use supervisor::{Connectivity, LinkState, LinkSupervisor, Verdict};
