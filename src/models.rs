use serde::{Deserialize, Serialize};

use crate::identity::Identity;
use crate::rate_limit::RateState;

/// One-shot response body for an admitted request.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WelcomeResponse {
    pub message: String,
    pub group: u16,
    pub rate_limit_left: u32,
    // always 0 for one-shot replies, stream events count from 1
    pub stream_seq: u32,
}

impl WelcomeResponse {
    pub fn new(identity: &Identity, state: &RateState) -> Self {
        Self {
            message: welcome_message(identity, state.visit_count),
            group: identity.group(),
            rate_limit_left: state.remaining_quota,
            stream_seq: 0,
        }
    }
}

// Query string of the admission endpoint; any unknown or missing value means one-shot
#[derive(Debug, Default)]
pub struct WelcomeQuery {
    pub stream: Option<String>,
}

// first `stream` pair wins when the key repeats
impl From<Vec<(String, String)>> for WelcomeQuery {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let stream = pairs
            .into_iter()
            .find(|(key, _)| key == "stream")
            .map(|(_, value)| value);
        Self { stream }
    }
}

impl WelcomeQuery {
    pub fn wants_stream(&self) -> bool {
        self.stream.as_deref() == Some("true")
    }
}

pub fn welcome_message(identity: &Identity, visit_count: u64) -> String {
    format!("Welcome {}, this is your visit #{}", identity, visit_count)
}
