//! Usage Log Task
//!
//! Background task that periodically logs the cache usage snapshot, at the
//! cadence a status panel would poll it.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStats;
use crate::proxy::MediaCache;

/// Spawns a background task that logs cache usage every `interval_secs`.
///
/// A line is logged at info level only when the snapshot changed since the
/// previous tick; unchanged ticks log at debug.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_stats_log_task(cache.clone(), 2);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_stats_log_task(cache: MediaCache, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting usage log task with interval of {} seconds",
            interval.as_secs()
        );

        let mut previous = CacheStats::default();
        loop {
            tokio::time::sleep(interval).await;

            let current = cache.stats();
            if current != previous {
                info!(
                    total_bytes = current.total_bytes,
                    entry_count = current.entry_count,
                    hit_count = current.hit_count,
                    in_flight = cache.in_flight_count(),
                    "cache usage"
                );
                previous = current;
            } else {
                debug!("cache usage unchanged");
            }
        }
    })
}
