pub mod cli;

use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use common::logger::init_logger;
use stream::{BinanceTransport, ConnectionState, LiquidationStream};
use syndication::{run_feed_poller, FeedClient, FeedState};

use cli::{stream_config_from_cli, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger("liqwatch", cli.json_logs);

    let cfg = stream_config_from_cli(&cli);
    let pipeline = LiquidationStream::start(cfg, BinanceTransport)?;
    let mut snapshots = pipeline.subscribe();
    let mut events = pipeline.events(64);

    if cli.feed_poll_secs > 0 {
        let client = FeedClient::new()?;
        let (feed_tx, feed_rx) = watch::channel(FeedState::default());
        tokio::spawn(run_feed_poller(
            client,
            Duration::from_secs(cli.feed_poll_secs),
            feed_tx,
        ));
        tokio::spawn(log_feed_updates(feed_rx));
    }

    let mut last_connection = snapshots.borrow().connection.clone();
    let mut last_alert = snapshots.borrow().whale_alert;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                pipeline.stop();
                return Ok(());
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    warn!("pipeline ended");
                    return Ok(());
                }
                let snap = snapshots.borrow().clone();
                if snap.connection != last_connection {
                    match snap.connection.state {
                        ConnectionState::Error | ConnectionState::Disconnected => warn!(
                            state = ?snap.connection.state,
                            error = snap.connection.error.as_deref(),
                            "connection state changed"
                        ),
                        _ => info!(state = ?snap.connection.state, "connection state changed"),
                    }
                    last_connection = snap.connection;
                }
                if snap.whale_alert != last_alert {
                    info!(active = snap.whale_alert, "whale alert");
                    last_alert = snap.whale_alert;
                }
            }
            event = events.recv() => {
                let Some(event) = event else {
                    warn!("pipeline ended");
                    return Ok(());
                };
                info!(
                    id = %event.id,
                    symbol = %event.symbol,
                    side = ?event.side,
                    quantity = event.quantity,
                    price = event.price,
                    notional = event.notional,
                    "liquidation"
                );
            }
        }
    }
}

async fn log_feed_updates(mut feed: watch::Receiver<FeedState>) {
    while feed.changed().await.is_ok() {
        let state = feed.borrow().clone();
        match state.source {
            Some(source) => info!(source, count = state.items.len(), "commentary feed refreshed"),
            None => warn!(count = state.items.len(), "commentary feed degraded to built-in dataset"),
        }
    }
}
