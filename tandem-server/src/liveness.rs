use crate::signaling::ConnectionTable;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Periodic heartbeat that evicts sockets which stopped answering pings.
pub struct LivenessMonitor {
    connections: Arc<ConnectionTable>,
    interval: Duration,
}

impl LivenessMonitor {
    pub fn new(connections: Arc<ConnectionTable>, interval: Duration) -> Self {
        Self {
            connections,
            interval,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        info!(interval = ?self.interval, "Liveness monitor started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; new sockets get a full interval.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let report = self.connections.sweep();
            debug!(
                probed = report.probed,
                evicted = report.evicted,
                "Liveness sweep finished"
            );
        }
    }
}
