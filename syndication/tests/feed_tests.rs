use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::timeout;

use syndication::{
    fetch_with_fallback, run_feed_poller, FeedFetcher, FeedItem, FeedState, SyndicationError,
    FEED_SOURCES,
};

/// Maps source URLs to canned outcomes and records the order of attempts.
struct MockFetcher {
    healthy: HashMap<&'static str, Vec<FeedItem>>,
    attempts: Mutex<Vec<String>>,
}

impl MockFetcher {
    fn new(healthy: HashMap<&'static str, Vec<FeedItem>>) -> Self {
        Self {
            healthy,
            attempts: Mutex::new(Vec::new()),
        }
    }

    fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedFetcher for MockFetcher {
    async fn fetch(&self, source_url: &str) -> Result<Vec<FeedItem>, SyndicationError> {
        self.attempts.lock().unwrap().push(source_url.to_string());
        match self.healthy.get(source_url) {
            Some(items) => Ok(items.clone()),
            None => Err(SyndicationError::EmptyFeed),
        }
    }
}

fn item(guid: &str, text: &str) -> FeedItem {
    FeedItem {
        guid: guid.to_string(),
        title: String::new(),
        pub_date: "2021-02-15 18:30:00".to_string(),
        link: String::new(),
        author: String::new(),
        description: text.to_string(),
    }
}

#[tokio::test]
async fn first_healthy_source_wins_in_order() {
    let fetcher = MockFetcher::new(HashMap::from([
        (FEED_SOURCES[1].url, vec![item("a", "second source")]),
        (FEED_SOURCES[2].url, vec![item("b", "third source")]),
    ]));

    let state = fetch_with_fallback(&fetcher).await;

    assert_eq!(state.source, Some(FEED_SOURCES[1].name));
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].guid, "a");
    // The third source is never touched once the second succeeds.
    assert_eq!(
        fetcher.attempts(),
        vec![FEED_SOURCES[0].url, FEED_SOURCES[1].url]
    );
}

#[tokio::test]
async fn total_failure_degrades_to_builtin_dataset() {
    let fetcher = MockFetcher::new(HashMap::new());

    let state = fetch_with_fallback(&fetcher).await;

    assert_eq!(state.source, None);
    assert!(!state.items.is_empty());
    assert!(state.items.iter().all(|i| !i.text().is_empty()));
    assert_eq!(fetcher.attempts().len(), FEED_SOURCES.len());
}

#[tokio::test]
async fn poller_publishes_and_stops_with_last_subscriber() {
    let fetcher = MockFetcher::new(HashMap::from([(
        FEED_SOURCES[0].url,
        vec![item("x", "fresh item")],
    )]));
    let (tx, mut rx) = watch::channel(FeedState::default());

    let poller = tokio::spawn(run_feed_poller(fetcher, Duration::from_millis(20), tx));

    timeout(Duration::from_secs(1), rx.changed())
        .await
        .expect("first publish within a second")
        .expect("sender alive");
    assert_eq!(rx.borrow().source, Some(FEED_SOURCES[0].name));

    drop(rx);
    timeout(Duration::from_secs(1), poller)
        .await
        .expect("poller exits once subscribers are gone")
        .expect("poller task does not panic");
}
