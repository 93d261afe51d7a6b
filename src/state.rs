use std::sync::Arc;

use crate::clock::Clock;
use crate::rate_limit::RateLimitStore;
use crate::stream::StreamConfig;

// app's shared state, handed to every handler
pub struct AppState {
    pub store: Arc<dyn RateLimitStore>,
    pub clock: Arc<dyn Clock>,
    pub stream: StreamConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn RateLimitStore>, clock: Arc<dyn Clock>, stream: StreamConfig) -> Self {
        Self {
            store,
            clock,
            stream,
        }
    }
}
