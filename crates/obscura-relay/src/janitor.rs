//! Background expiry sweeper.
//!
//! The janitor owns a periodic task that walks every token queue and
//! drops expired messages. Each per-token step takes the store lock on its
//! own and the task yields between steps, so a sweep never starves
//! steady-state put/poll/consume traffic.
//!
//! The server lifecycle owns the [`Janitor`] handle: shutdown signals the
//! task, which runs one final sweep and exits, bounded by a timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::api::RelayState;

/// How long shutdown waits for the final sweep.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Handle to the background sweep task.
pub struct Janitor {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl Janitor {
    /// Spawn the sweeper with the given interval.
    pub fn spawn(state: Arc<RelayState>, interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        sweep(&state).await;
                    }
                    _ = shutdown_rx.changed() => {
                        sweep(&state).await;
                        debug!("janitor stopped");
                        return;
                    }
                }
            }
        });

        Self { shutdown_tx, task }
    }

    /// Signal shutdown and wait (bounded) for the final sweep.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if tokio::time::timeout(SHUTDOWN_GRACE, self.task).await.is_err() {
            warn!("janitor did not stop within grace period");
        }
    }
}

/// One full pass over the store, one token at a time.
///
/// The lock is re-acquired per token and the task yields between steps;
/// request handlers only ever contend with a single bounded step.
async fn sweep(state: &RelayState) {
    let tokens = state.store().lock().token_keys();
    let now = RelayState::now_epoch_secs();

    let mut swept = 0;
    for token in tokens {
        swept += state.store().lock().sweep_token(&token, now);
        tokio::task::yield_now().await;
    }

    if swept > 0 {
        debug!(swept, "janitor sweep");
    }
}
