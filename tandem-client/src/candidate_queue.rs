use crate::transport::PeerTransport;
use std::collections::VecDeque;
use tandem_core::IceCandidateInit;
use tracing::{debug, warn};

/// Remote ICE candidates that arrived before the remote description was
/// applied. Kept in arrival order.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    pending: VecDeque<IceCandidateInit>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, candidate: IceCandidateInit) {
        self.pending.push_back(candidate);
        debug!(queued = self.pending.len(), "Remote candidate queued");
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Applies every queued candidate, oldest first, and empties the queue.
    ///
    /// The queue is emptied up front, so a candidate the transport rejects is
    /// logged and not retried. Returns how many were accepted.
    pub async fn flush_into(&mut self, transport: &dyn PeerTransport) -> usize {
        let batch: Vec<_> = self.pending.drain(..).collect();
        let total = batch.len();
        let mut applied = 0;

        for candidate in batch {
            match transport.add_ice_candidate(candidate).await {
                Ok(()) => applied += 1,
                Err(e) => warn!("Failed to apply queued ICE candidate: {:#}", e),
            }
        }

        if total > 0 {
            debug!(applied, total, "Flushed queued remote candidates");
        }
        applied
    }
}
