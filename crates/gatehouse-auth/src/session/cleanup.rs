//! Periodic reaping of expired sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use super::store::SessionStore;

/// Background task that purges expired sessions on a fixed interval.
///
/// Lookups already ignore expired entries; each sweep drops them and runs
/// the cache's pending maintenance so memory stays bounded.
#[derive(Debug, Clone)]
pub struct SessionCleanup {
    /// Store to sweep.
    store: Arc<SessionStore>,
    /// Time between sweeps.
    interval: Duration,
}

impl SessionCleanup {
    /// Creates a new session cleanup task.
    pub fn new(store: Arc<SessionStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Runs one sweep. Returns the number of sessions removed.
    pub fn run_cleanup(&self) -> usize {
        let removed = self.store.purge_expired();
        if removed > 0 {
            info!(removed, remaining = self.store.len(), "Expired sessions reaped");
        } else {
            debug!("No expired sessions to reap");
        }
        removed
    }

    /// Sweeps until the cancel signal flips to `true`.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "Session reaper started");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.run_cleanup();
                }
            }
        }

        info!("Session reaper stopped");
    }

    /// Spawns [`run`](Self::run) on the current runtime.
    pub fn spawn(self, cancel: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}
