use std::sync::Arc;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::EvictionConfig;
use crate::metrics::TRACKED_IDENTITIES;
use crate::rate_limit::RateLimitStore;

// Idle-identity eviction, runs every `sweep_interval` until shutdown
pub async fn idle_sweeper(
    store: Arc<dyn RateLimitStore>,
    clock: Arc<dyn Clock>,
    config: EvictionConfig,
    shutdown: CancellationToken,
) {
    let mut interval = interval(config.sweep_interval);

    tracing::info!(
        idle_secs = config.idle_secs,
        sweep_interval = ?config.sweep_interval,
        "idle sweeper started"
    );

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        let evicted = store.evict_idle(clock.now_secs(), config.idle_secs);
        let remaining = store.len();
        TRACKED_IDENTITIES.set(remaining as f64);

        if evicted > 0 {
            tracing::info!(evicted, remaining, "evicted idle identities");
        }
    }

    tracing::info!("idle sweeper stopped");
}
