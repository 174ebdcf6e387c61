//! Periodic trigger source for the time-based summary check.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Notify;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::scribe::runtime::command::ScribeHandle;

/// Sends a tick to the runtime at a fixed period.
pub struct TriggerTicker {
    handle: ScribeHandle,
    period: Duration,
    shutdown: Arc<Notify>,
}

impl TriggerTicker {
    /// Create a ticker that fires every `interval_minutes`.
    ///
    /// Returns `None` when the time trigger is disabled.
    #[must_use]
    pub fn new(handle: ScribeHandle, interval_minutes: u64) -> Option<Self> {
        let period = Duration::from_secs(interval_minutes.saturating_mul(60));
        (interval_minutes > 0).then(|| Self::with_period(handle, period))
    }

    /// Create a ticker with an explicit period.
    #[must_use]
    pub fn with_period(handle: ScribeHandle, period: Duration) -> Self {
        Self {
            handle,
            period,
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Get a shutdown notifier to stop the ticker.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the ticker as a tokio task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        info!(period = ?self.period, "Starting summary ticker");

        loop {
            tokio::select! {
                () = tokio::time::sleep(self.period) => {
                    if !self.tick() {
                        break;
                    }
                }
                () = self.shutdown.notified() => {
                    info!("Summary ticker shutting down");
                    break;
                }
            }
        }
    }

    /// Queue one tick; returns false once the runtime is gone.
    fn tick(&self) -> bool {
        match self.handle.try_tick(Utc::now()) {
            Ok(()) => debug!("Summary tick queued"),
            Err(TrySendError::Full(_)) => warn!("Command queue full, tick dropped"),
            Err(TrySendError::Closed(_)) => {
                info!("Runtime closed, summary ticker stopping");
                return false;
            }
        }
        true
    }
}
