mod health;
mod metrics;
mod welcome;

use axum::{Router, routing::get};
use std::sync::Arc;

use crate::state::AppState;

pub use health::health_handler;
pub use metrics::metrics_handler;
pub use welcome::welcome_handler;

/// Ops endpoints plus the admission handler on every other path and method.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(welcome_handler)
        .with_state(state)
}
