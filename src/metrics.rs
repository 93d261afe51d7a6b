use lazy_static::lazy_static;
use prometheus::{
    Counter, Encoder, Gauge, Histogram, IntCounterVec, TextEncoder, register_counter,
    register_gauge, register_histogram, register_int_counter_vec,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("gatekeeper_requests_total", "Total number of admission requests").unwrap();
    pub static ref UNAUTHORIZED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gatekeeper_unauthorized_total",
        "Requests rejected for a bad credential",
        &["reason"]
    )
    .unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("gatekeeper_rate_limited_total", "Requests rejected by the rate limiter").unwrap();
    pub static ref ADMITTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gatekeeper_admitted_total",
        "Admitted requests by response mode",
        &["mode"]
    )
    .unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "gatekeeper_request_latency_seconds",
        "Time to produce the response head in seconds"
    )
    .unwrap();
    pub static ref ACTIVE_STREAMS: Gauge =
        register_gauge!("gatekeeper_active_streams", "Streaming responses still emitting").unwrap();
    pub static ref STREAM_EVENTS: Counter =
        register_counter!("gatekeeper_stream_events_total", "Events pushed to streaming responses").unwrap();
    pub static ref TRACKED_IDENTITIES: Gauge =
        register_gauge!("gatekeeper_tracked_identities", "Identities held by the rate limiter").unwrap();
}

/// Render the default registry in the Prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
