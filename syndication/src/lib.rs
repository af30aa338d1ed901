//! Secondary commentary feed.
//!
//! Polls a set of syndication sources through an RSS-to-JSON conversion
//! API, first healthy source wins, and publishes the cleaned items through
//! a watch channel. When every source is down the feed degrades to a fixed
//! built-in dataset instead of going empty.

pub mod client;
pub mod errors;
pub mod fallback;
pub mod poller;
pub mod types;

pub use client::{FeedClient, FeedFetcher};
pub use errors::SyndicationError;
pub use poller::{fetch_with_fallback, run_feed_poller};
pub use types::{FeedItem, FeedSource, FeedState, FEED_SOURCES};
