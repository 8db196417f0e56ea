//! Periodic cache expiry
//!
//! Runs `SearchController::sweep_expired` on a fixed interval, independent of
//! user activity, until the shutdown token is cancelled.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::controller::SearchController;
use crate::token::CancelToken;

/// Default interval between sweeps (60 seconds)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn the sweep loop for `controller`.
pub fn spawn_sweeper(
    controller: SearchController,
    every: Duration,
    shutdown: CancelToken,
) -> JoinHandle<()> {
    tokio::spawn(run_sweeper(controller, every, shutdown))
}

/// Sweep loop; returns once `shutdown` is cancelled.
pub async fn run_sweeper(controller: SearchController, every: Duration, shutdown: CancelToken) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Cache sweeper started for {} searches (interval: {}s)",
        controller.field().as_str(),
        every.as_secs()
    );

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Cache sweeper stopping");
                break;
            }
            _ = ticker.tick() => {
                let removed = controller.sweep_expired(Instant::now());
                debug!("Sweep removed {} entries ({} left)", removed, controller.cache_len());
            }
        }
    }
}
