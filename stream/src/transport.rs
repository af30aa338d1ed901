use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Transport-level failures, classified for the retry policy.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The exchange is rate limiting this client (HTTP 429). Reconnecting
    /// immediately would worsen the condition, so the supervisor halts
    /// until an external restart.
    #[error("rate limited by exchange: {0}")]
    RateLimited(String),

    /// Any other network-level failure or abrupt close.
    #[error("network failure: {0}")]
    Network(String),
}

/// One event out of an open transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// One text frame from the feed.
    Frame(String),
    /// The transport is gone; no further events follow.
    Disrupted(TransportError),
}

/// Handle to an open transport.
///
/// `close` performs a normal-closure handshake. Dropping the handle without
/// calling it leaves shutdown to the remote end.
#[derive(Debug)]
pub struct TransportHandle {
    close_tx: Option<oneshot::Sender<()>>,
}

impl TransportHandle {
    pub fn new(close_tx: oneshot::Sender<()>) -> Self {
        Self {
            close_tx: Some(close_tx),
        }
    }

    /// Ask the transport to close with a normal-closure code. The pump
    /// stops forwarding events as soon as it observes the request.
    pub fn close(mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Seam between the connection supervisor and the wire.
///
/// `open` resolves once the connection is established; afterwards the
/// implementation forwards frames and the terminal disruption into
/// `events`. Implementations send at most one `Disrupted` and nothing
/// after it.
#[async_trait]
pub trait LiquidationTransport: Send + Sync + 'static {
    async fn open(
        &self,
        url: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<TransportHandle, TransportError>;
}
