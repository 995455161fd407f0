//! Broker connectivity checking and recovery.

use kestrel_broker::{BrokerResult, DynBroker};
use kestrel_notify::{Notifier, Priority};
use std::sync::Arc;
use tracing::{info, warn};

/// Checks the broker connection each cycle and repairs it when lost.
///
/// One reconnect attempt per cycle; recovery time is bounded by the cycle
/// interval, not by retries here. The restored notification fires exactly
/// once per outage.
pub struct ConnectivityMonitor {
    broker: DynBroker,
    notifier: Arc<Notifier>,
    outage: bool,
}

impl ConnectivityMonitor {
    pub fn new(broker: DynBroker, notifier: Arc<Notifier>) -> Self {
        Self {
            broker,
            notifier,
            outage: false,
        }
    }

    pub async fn ensure_connected(&mut self) -> BrokerResult<()> {
        if self.broker.is_connected() {
            // The gateway may recover on its own between cycles.
            if self.outage {
                self.outage = false;
                self.notify_restored().await;
            }
            return Ok(());
        }

        warn!(broker = self.broker.name(), "Broker disconnected, attempting reconnect");
        self.outage = true;
        match self.broker.reconnect().await {
            Ok(()) => {
                self.outage = false;
                self.notify_restored().await;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Reconnect failed, retrying next cycle");
                Err(e)
            }
        }
    }

    async fn notify_restored(&self) {
        info!(broker = self.broker.name(), "Broker connection restored");
        self.notifier
            .send(
                "Connection Restored",
                &format!("Broker {} connection re-established", self.broker.name()),
                Priority::Medium,
            )
            .await;
    }
}
