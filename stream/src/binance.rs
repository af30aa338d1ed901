//! WebSocket transport for the exchange force-order feed.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{WebSocketStream, connect_async};
use tracing::{debug, warn};

use crate::transport::{LiquidationTransport, TransportError, TransportEvent, TransportHandle};

/// Production transport: one tokio-tungstenite connection per `open`.
#[derive(Debug, Default, Clone)]
pub struct BinanceTransport;

#[async_trait]
impl LiquidationTransport for BinanceTransport {
    async fn open(
        &self,
        url: &str,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<TransportHandle, TransportError> {
        let (ws, _) = connect_async(url).await.map_err(classify)?;
        debug!(endpoint = %url, "websocket connected");

        let (close_tx, close_rx) = oneshot::channel();
        tokio::spawn(pump(ws, events, close_rx));
        Ok(TransportHandle::new(close_tx))
    }
}

async fn pump<S>(
    ws: WebSocketStream<S>,
    events: mpsc::Sender<TransportEvent>,
    mut close_rx: oneshot::Receiver<()>,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut write, mut read) = ws.split();

    loop {
        tokio::select! {
            // Teardown wins: once close is requested nothing more is
            // forwarded upstream.
            _ = &mut close_rx => {
                let frame = CloseFrame {
                    code: CloseCode::Normal,
                    reason: "client shutdown".into(),
                };
                if let Err(e) = write.send(Message::Close(Some(frame))).await {
                    debug!(error = %e, "close handshake failed");
                }
                return;
            }
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    // Send failure means the supervisor is gone.
                    let frame = TransportEvent::Frame(text.as_str().to_owned());
                    if events.send(frame).await.is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("close {}: {}", u16::from(f.code), f.reason))
                        .unwrap_or_else(|| "closed by remote".to_string());
                    warn!(%reason, "websocket closed");
                    let _ = events
                        .send(TransportEvent::Disrupted(TransportError::Network(reason)))
                        .await;
                    return;
                }
                Some(Ok(_)) => {} // pings, pongs, binary: not part of the feed
                Some(Err(e)) => {
                    let err = classify(e);
                    warn!(error = %err, "websocket stream error");
                    let _ = events.send(TransportEvent::Disrupted(err)).await;
                    return;
                }
                None => {
                    let _ = events
                        .send(TransportEvent::Disrupted(TransportError::Network(
                            "stream ended".to_string(),
                        )))
                        .await;
                    return;
                }
            }
        }
    }
}

/// Map a tungstenite error onto the retry taxonomy. A 429 handshake
/// response, or an error whose message carries the 429 status, means the
/// exchange is rate limiting us.
fn classify(e: tungstenite::Error) -> TransportError {
    if let tungstenite::Error::Http(resp) = &e {
        if resp.status().as_u16() == 429 {
            return TransportError::RateLimited(format!("http {}", resp.status()));
        }
    }
    let text = e.to_string();
    if text.contains("429") {
        return TransportError::RateLimited(text);
    }
    TransportError::Network(text)
}
