use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::errors::SyndicationError;
use crate::types::{FeedEnvelope, FeedItem, CONVERSION_API, ITEMS_PER_POLL};

/// Seam between the poller and the conversion API, mockable in tests.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch one source through the conversion API. Items with no usable
    /// text are already filtered out; an empty result is an error.
    async fn fetch(&self, source_url: &str) -> Result<Vec<FeedItem>, SyndicationError>;
}

#[derive(Clone)]
pub struct FeedClient {
    http: Client,
    api: String,
}

impl FeedClient {
    pub fn new() -> Result<Self, SyndicationError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("liqwatch/0.1")
            .build()?;

        Ok(Self {
            http,
            api: CONVERSION_API.to_string(),
        })
    }
}

#[async_trait]
impl FeedFetcher for FeedClient {
    #[instrument(skip(self), level = "debug")]
    async fn fetch(&self, source_url: &str) -> Result<Vec<FeedItem>, SyndicationError> {
        let resp = self
            .http
            .get(&self.api)
            .query(&[
                ("rss_url", source_url),
                ("count", &ITEMS_PER_POLL.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let envelope: FeedEnvelope = resp.json().await?;
        if envelope.status != "ok" {
            return Err(SyndicationError::EmptyFeed);
        }

        let items: Vec<FeedItem> = envelope
            .items
            .into_iter()
            .filter(|item| !item.text().is_empty())
            .collect();

        if items.is_empty() {
            return Err(SyndicationError::EmptyFeed);
        }

        debug!(count = items.len(), "feed fetched");
        Ok(items)
    }
}
