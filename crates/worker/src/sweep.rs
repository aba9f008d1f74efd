//! Periodic retention sweep of the runtime stores.

use std::sync::Arc;
use std::time::Duration;

use swcache_core::cache::{SweepReport, sweep_expired};
use swcache_core::{CacheStorage, Error, StoreNames, StoreRole};
use tokio::task::JoinHandle;

/// Stores whose entries age out. Static and image stores only change on a version bump.
pub const SWEPT_ROLES: [StoreRole; 2] = [StoreRole::Dynamic, StoreRole::Api];

/// One sweep pass over the current runtime stores.
pub async fn run_once(
    storage: &dyn CacheStorage, names: &StoreNames, retention: chrono::Duration,
) -> Result<SweepReport, Error> {
    let stores: Vec<String> = SWEPT_ROLES.into_iter().map(|role| names.name(role)).collect();
    sweep_expired(storage, &stores, retention, chrono::Utc::now()).await
}

/// Sweep every `every`, starting one period from now. Failures are logged.
pub fn spawn_periodic(
    storage: Arc<dyn CacheStorage>, names: StoreNames, retention: chrono::Duration, every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match run_once(storage.as_ref(), &names, retention).await {
                Ok(report) => tracing::info!(
                    inspected = report.inspected,
                    removed = report.removed.len(),
                    undated = report.undated,
                    "cache cleanup completed"
                ),
                Err(e) => tracing::error!(error = %e, "cache cleanup failed"),
            }
        }
    })
}
