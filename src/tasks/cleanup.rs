//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from every
//! registered cache. Expired entries are already semantically absent, so
//! the sweep only shortens how long they physically linger.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheRegistry;

/// Spawns the periodic expiry sweep over a registry.
///
/// Returns the task handle so shutdown can abort it.
pub fn spawn_cleanup_task(
    registry: Arc<CacheRegistry>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            interval_secs = cleanup_interval_secs,
            "starting expiry sweep task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = registry.cleanup_expired().await;
            if removed > 0 {
                info!(removed, "expiry sweep removed entries");
            } else {
                debug!("expiry sweep found nothing to remove");
            }
        }
    })
}
