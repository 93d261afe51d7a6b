use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::metrics::{ACTIVE_STREAMS, STREAM_EVENTS};

pub const DEFAULT_STREAM_EVENTS: u32 = 5;
pub const DEFAULT_STREAM_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub events: u32,
    // delay before the first event and between events
    pub interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            events: DEFAULT_STREAM_EVENTS,
            interval: DEFAULT_STREAM_INTERVAL,
        }
    }
}

// Snapshot taken at admission time, ticks never go back to the store
#[derive(Debug, Clone)]
pub struct WelcomeFeed {
    pub message: String,
    pub rate_limit_left: u32,
}

impl WelcomeFeed {
    pub fn event_data(&self, seq: u32) -> String {
        format!(
            "{} \"stream_seq: {}\" \"rate: {}\"",
            self.message, seq, self.rate_limit_left
        )
    }
}

/// Receiving half of a feed. Dropping it cancels the producer task.
pub struct FeedStream {
    inner: ReceiverStream<String>,
    cancel: CancellationToken,
    finished: CancellationToken,
    _guard: DropGuard,
}

impl FeedStream {
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // fires once the producer task has returned
    pub fn finished(&self) -> CancellationToken {
        self.finished.clone()
    }
}

impl Stream for FeedStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

// One producer task per streaming response
pub fn spawn_feed(feed: WelcomeFeed, config: StreamConfig) -> FeedStream {
    let (tx, rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    let finished = CancellationToken::new();

    ACTIVE_STREAMS.inc();
    let task_cancel = cancel.clone();
    let task_finished = finished.clone();
    tokio::spawn(async move {
        run_feed(feed, config, tx, task_cancel).await;
        ACTIVE_STREAMS.dec();
        task_finished.cancel();
    });

    FeedStream {
        inner: ReceiverStream::new(rx),
        _guard: cancel.clone().drop_guard(),
        cancel,
        finished,
    }
}

async fn run_feed(
    feed: WelcomeFeed,
    config: StreamConfig,
    tx: mpsc::Sender<String>,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + config.interval, config.interval);

    for seq in 1..=config.events {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(seq, "stream cancelled before tick");
                return;
            }
            _ = ticker.tick() => {}
        }

        if cancel.is_cancelled() {
            return;
        }
        if tx.send(feed.event_data(seq)).await.is_err() {
            tracing::debug!(seq, "stream receiver gone");
            return;
        }
        STREAM_EVENTS.inc();
    }

    tracing::debug!(events = config.events, "stream complete");
    // dropping `tx` ends the response body
}
