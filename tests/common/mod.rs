#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header::AUTHORIZATION};
use edge_gatekeeper::clock::ManualClock;
use edge_gatekeeper::handlers::router;
use edge_gatekeeper::rate_limit::{MemoryRateStore, RateLimitPolicy};
use edge_gatekeeper::state::AppState;
use edge_gatekeeper::stream::StreamConfig;
use std::sync::Arc;

pub struct Harness {
    pub app: Router,
    pub store: Arc<MemoryRateStore>,
    pub clock: Arc<ManualClock>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemoryRateStore::new(RateLimitPolicy::default()));
    let clock = Arc::new(ManualClock::new(0));
    let state = AppState::new(store.clone(), clock.clone(), StreamConfig::default());
    Harness {
        app: router(Arc::new(state)),
        store,
        clock,
    }
}

pub fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}
