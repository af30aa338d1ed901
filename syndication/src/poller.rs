//! Syndication feed poller.
//!
//! Each tick walks the source list in order and publishes the first
//! non-empty result; a tick where every source fails publishes the built-in
//! fallback dataset so subscribers always have something to show.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::client::FeedFetcher;
use crate::fallback::fallback_items;
use crate::types::{FeedState, FEED_SOURCES};

/// Try every source in order; degrade to the fallback dataset when all of
/// them fail. Never an error to the caller.
pub async fn fetch_with_fallback<F: FeedFetcher>(fetcher: &F) -> FeedState {
    for source in FEED_SOURCES {
        match fetcher.fetch(source.url).await {
            Ok(items) => {
                info!(source = source.name, count = items.len(), "feed refreshed");
                return FeedState {
                    items,
                    source: Some(source.name),
                };
            }
            Err(err) => {
                warn!(source = source.name, error = %err, "feed source failed");
            }
        }
    }

    warn!("all feed sources exhausted; serving built-in dataset");
    FeedState {
        items: fallback_items(),
        source: None,
    }
}

/// Poll loop. Publishes into `states` every `poll_every`; returns when the
/// last subscriber is gone.
pub async fn run_feed_poller<F: FeedFetcher>(
    fetcher: F,
    poll_every: Duration,
    states: watch::Sender<FeedState>,
) {
    let mut ticker = interval(poll_every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(every_ms = poll_every.as_millis() as u64, "feed poller started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let state = fetch_with_fallback(&fetcher).await;
                if states.send(state).is_err() {
                    return;
                }
            }
            _ = states.closed() => return,
        }
    }
}
