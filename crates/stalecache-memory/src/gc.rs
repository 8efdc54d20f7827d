//! Background garbage collection for the memory driver.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::store::Store;

/// Handle for controlling a running collector.
///
/// The collector stops when the handle is dropped.
#[derive(Debug)]
pub struct GcHandle {
    /// Sender to signal shutdown.
    shutdown_tx: watch::Sender<bool>,
}

impl GcHandle {
    /// Signals the collector to stop.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Returns true once the collector task has exited.
    pub fn is_stopped(&self) -> bool {
        self.shutdown_tx.is_closed()
    }
}

impl Drop for GcHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Periodic mark-and-sweep collector.
pub(crate) struct GcScheduler {
    store: Arc<Store>,
    interval: Duration,
}

impl GcScheduler {
    pub(crate) fn new(store: Arc<Store>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Starts the background collection task.
    ///
    /// The first cycle runs immediately, then once per interval.
    pub(crate) fn start(self) -> GcHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = GcHandle { shutdown_tx };

        tokio::spawn(self.run(shutdown_rx));

        handle
    }

    async fn run(self, mut shutdown_rx: watch::Receiver<bool>) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(interval = ?self.interval, "Starting memory driver collector");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let swept = self.store.collect();
                    if swept > 0 {
                        debug!(swept, "Expired items swept");
                    }
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Memory driver collector shutting down");
                        break;
                    }
                }
            }
        }
    }
}
