use std::time::Duration;

use clap::Parser;

use stream::types::{StreamConfig, FALLBACK_URL, PRIMARY_URL};

#[derive(Debug, Parser)]
#[clap(name = "liqwatch", version)]
pub struct Cli {
    /// Primary force-order feed endpoint
    #[clap(long, default_value = PRIMARY_URL)]
    pub primary_url: String,

    /// Alternate endpoint, tried once after the primary fails
    #[clap(long, default_value = FALLBACK_URL)]
    pub fallback_url: String,

    /// How many liquidations to retain, most-recent-first
    #[clap(long, default_value = "10")]
    pub capacity: usize,

    /// Notional value (USD) at or above which the whale alert arms
    #[clap(long, default_value = "100000")]
    pub whale_threshold: f64,

    /// Whale alert decay window in milliseconds
    #[clap(long, default_value = "2000")]
    pub alert_decay_ms: u64,

    /// Commentary feed poll interval in seconds; 0 disables the feed
    #[clap(long, default_value = "60")]
    pub feed_poll_secs: u64,

    /// Emit logs as JSON
    #[clap(long)]
    pub json_logs: bool,
}

/// Build the pipeline configuration from CLI flags.
pub(crate) fn stream_config_from_cli(cli: &Cli) -> StreamConfig {
    StreamConfig {
        primary_url: cli.primary_url.clone(),
        fallback_url: cli.fallback_url.clone(),
        capacity: cli.capacity,
        whale_threshold: cli.whale_threshold,
        alert_decay: Duration::from_millis(cli.alert_decay_ms),
        ..StreamConfig::default()
    }
}
