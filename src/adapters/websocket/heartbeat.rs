//! Periodic liveness pings and presence logging.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::hub::RealtimeHub;

/// Sends `ping` to every connection each `every`.
pub fn spawn_heartbeat(hub: Arc<RealtimeHub>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let reached = hub.heartbeat().await;
            tracing::trace!(reached, "Heartbeat sent");
        }
    })
}

/// Logs presence counts each `every`.
pub fn spawn_stats_logger(hub: Arc<RealtimeHub>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let stats = hub.stats().await;
            tracing::info!(
                customers = stats.customers,
                restaurants = stats.restaurants,
                delivery = stats.delivery,
                admins = stats.admins,
                total = stats.total,
                "Connection stats"
            );
        }
    })
}
