use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use edge_gatekeeper::clock::{Clock, SystemClock};
use edge_gatekeeper::config::{Args, GatewayConfig};
use edge_gatekeeper::handlers::router;
use edge_gatekeeper::rate_limit::{MemoryRateStore, RateLimitStore};
use edge_gatekeeper::state::AppState;
use edge_gatekeeper::sweeper::idle_sweeper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("edge_gatekeeper=info")),
        )
        .init();

    let config = GatewayConfig::try_from(Args::parse())?;

    let store: Arc<dyn RateLimitStore> = Arc::new(MemoryRateStore::new(config.policy));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = Arc::new(AppState::new(store.clone(), clock.clone(), config.stream));
    let shutdown = CancellationToken::new();

    if let Some(eviction) = config.eviction {
        tokio::spawn(idle_sweeper(store, clock, eviction, shutdown.clone()));
    }

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "gatekeeper listening");
    tracing::info!(
        max_per_window = config.policy.max_per_window,
        window_secs = config.policy.window_secs,
        "rate limit"
    );
    tracing::info!(
        events = config.stream.events,
        interval = ?config.stream.interval,
        "stream feed"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutting down");
    shutdown.cancel();
}
