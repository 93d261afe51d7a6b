use clap::Parser;
use std::time::Duration;

use crate::error::ConfigError;
use crate::rate_limit::{DEFAULT_MAX_PER_WINDOW, DEFAULT_WINDOW_SECS, RateLimitPolicy};
use crate::stream::{DEFAULT_STREAM_EVENTS, StreamConfig};

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "edge-gatekeeper")]
#[command(about = "Token-authenticated, rate-limited welcome endpoint with optional event streaming")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "EDGE_GATEKEEPER_PORT", default_value_t = 8080)]
    pub port: u16,

    // Max admitted requests per window
    #[arg(long, env = "EDGE_GATEKEEPER_RATE_LIMIT", default_value_t = DEFAULT_MAX_PER_WINDOW)]
    pub rate_limit: u32,

    // Rate limit window in seconds
    #[arg(long, env = "EDGE_GATEKEEPER_RATE_WINDOW", default_value_t = DEFAULT_WINDOW_SECS)]
    pub rate_window: u64,

    // Events per streaming response
    #[arg(long, env = "EDGE_GATEKEEPER_STREAM_EVENTS", default_value_t = DEFAULT_STREAM_EVENTS)]
    pub stream_events: u32,

    // Milliseconds between stream events
    #[arg(long, env = "EDGE_GATEKEEPER_STREAM_INTERVAL_MS", default_value_t = 1000)]
    pub stream_interval_ms: u64,

    // Forget identities idle this many seconds (unset: keep forever)
    #[arg(long, env = "EDGE_GATEKEEPER_EVICT_IDLE_SECS")]
    pub evict_idle_secs: Option<u64>,

    // Seconds between eviction sweeps
    #[arg(long, env = "EDGE_GATEKEEPER_SWEEP_INTERVAL", default_value_t = 60)]
    pub sweep_interval: u64,
}

/// Validated runtime settings derived from [`Args`].
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub port: u16,
    pub policy: RateLimitPolicy,
    pub stream: StreamConfig,
    pub eviction: Option<EvictionConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvictionConfig {
    pub idle_secs: u64,
    pub sweep_interval: Duration,
}

impl TryFrom<Args> for GatewayConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        if args.rate_limit == 0 {
            return Err(ConfigError::Zero("rate-limit"));
        }
        if args.rate_window == 0 {
            return Err(ConfigError::Zero("rate-window"));
        }
        if args.stream_events == 0 {
            return Err(ConfigError::Zero("stream-events"));
        }
        if args.stream_interval_ms == 0 {
            return Err(ConfigError::Zero("stream-interval-ms"));
        }

        let eviction = match args.evict_idle_secs {
            Some(0) => return Err(ConfigError::Zero("evict-idle-secs")),
            Some(idle_secs) => {
                if args.sweep_interval == 0 {
                    return Err(ConfigError::Zero("sweep-interval"));
                }
                Some(EvictionConfig {
                    idle_secs,
                    sweep_interval: Duration::from_secs(args.sweep_interval),
                })
            }
            None => None,
        };

        Ok(Self {
            port: args.port,
            policy: RateLimitPolicy {
                max_per_window: args.rate_limit,
                window_secs: args.rate_window,
            },
            stream: StreamConfig {
                events: args.stream_events,
                interval: Duration::from_millis(args.stream_interval_ms),
            },
            eviction,
        })
    }
}
