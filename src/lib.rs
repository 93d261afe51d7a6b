//! Token-authenticated, per-caller rate-limited welcome endpoint.
//!
//! A request carrying `Authorization: <scheme> USER<ddd>` is resolved to an
//! [`identity::Identity`], charged against the [`rate_limit::RateLimitStore`]
//! and answered either with a single JSON body or, with `?stream=true`, with a
//! short server-sent event feed.

pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod rate_limit;
pub mod state;
pub mod stream;
pub mod sweeper;
