use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{
        HeaderMap,
        header::{ACCESS_CONTROL_ALLOW_HEADERS, CONNECTION},
    },
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
};
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{GatewayError, GatewayResult};
use crate::identity::Identity;
use crate::metrics::{
    ADMITTED_TOTAL, RATE_LIMITED_TOTAL, REQUEST_LATENCY, REQUEST_TOTAL, TRACKED_IDENTITIES,
    UNAUTHORIZED_TOTAL,
};
use crate::models::{WelcomeQuery, WelcomeResponse, welcome_message};
use crate::state::AppState;
use crate::stream::{WelcomeFeed, spawn_feed};

const STREAM_ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept";

/// Resolve the caller, charge the rate limiter, then reply once or stream.
pub async fn welcome_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> GatewayResult<Response> {
    REQUEST_TOTAL.inc();
    let start_time = Instant::now();

    let identity = match Identity::from_headers(&headers) {
        Ok(identity) => identity,
        Err(reason) => {
            UNAUTHORIZED_TOTAL.with_label_values(&[reason.as_label()]).inc();
            tracing::debug!(reason = %reason, "rejected credential");
            return Err(GatewayError::Unauthorized(reason));
        }
    };
    let group = identity.group();

    let rate = match state.store.admit(&identity, state.clock.now_secs()) {
        Ok(rate) => rate,
        Err(err) => {
            RATE_LIMITED_TOTAL.inc();
            tracing::info!(identity = %identity, group, "rate limit exceeded");
            return Err(err);
        }
    };
    TRACKED_IDENTITIES.set(state.store.len() as f64);

    // a malformed query string falls back to one-shot
    let wants_stream = query
        .map(|Query(pairs)| WelcomeQuery::from(pairs).wants_stream())
        .unwrap_or(false);

    tracing::info!(
        identity = %identity,
        group,
        visit = rate.visit_count,
        rate_limit_left = rate.remaining_quota,
        stream = wants_stream,
        "admitted"
    );

    let response = if wants_stream {
        ADMITTED_TOTAL.with_label_values(&["stream"]).inc();
        let feed = WelcomeFeed {
            message: welcome_message(&identity, rate.visit_count),
            rate_limit_left: rate.remaining_quota,
        };
        let events = spawn_feed(feed, state.stream)
            .map(|data| Ok::<_, Infallible>(Event::default().data(data)));
        (
            [
                (CONNECTION, "keep-alive"),
                (ACCESS_CONTROL_ALLOW_HEADERS, STREAM_ALLOW_HEADERS),
            ],
            Sse::new(events),
        )
            .into_response()
    } else {
        ADMITTED_TOTAL.with_label_values(&["one_shot"]).inc();
        Json(WelcomeResponse::new(&identity, &rate)).into_response()
    };

    REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
    Ok(response)
}
