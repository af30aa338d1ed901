//! Connection supervisor.
//!
//! One supervisor task per pipeline owns the full connection lifecycle and
//! every piece of mutable pipeline state (connection status, ring buffer,
//! whale alert), so all mutation is serialized through a single writer.
//!
//! Lifecycle: `Disconnected → Connecting → Connected`, with a single
//! fallback-endpoint retry after the primary fails and a hard halt on a
//! rate-limit signal. Inbound frames are processed to completion, strictly
//! sequentially, inside one `select!` loop; the stabilization delay, the
//! fallback backoff, and the alert decay are cancellable branches of that
//! same loop, so arming a new timer of a category structurally replaces the
//! previous one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

use crate::alert::WhaleAlert;
use crate::buffer::RingBuffer;
use crate::decoder::{self, DecodeError};
use crate::transport::{LiquidationTransport, TransportError, TransportEvent, TransportHandle};
use crate::types::{ConnectionState, ConnectionStatus, Liquidation, StreamConfig, StreamSnapshot};

/// Requests from the facade to the supervisor.
pub(crate) enum Command {
    Stop,
    Observe(mpsc::Sender<Liquidation>),
}

/// How a connected session ended.
enum SessionEnd {
    Stop,
    Disrupted(TransportError),
}

pub(crate) struct Supervisor<T> {
    cfg: StreamConfig,
    transport: Arc<T>,
    buffer: RingBuffer,
    alert: WhaleAlert,
    status: ConnectionStatus,
    observers: Vec<mpsc::Sender<Liquidation>>,
    seq: u64,
    snapshots: watch::Sender<StreamSnapshot>,
    stopped: Arc<AtomicBool>,
}

impl<T: LiquidationTransport> Supervisor<T> {
    pub(crate) fn new(
        cfg: StreamConfig,
        transport: Arc<T>,
        snapshots: watch::Sender<StreamSnapshot>,
        stopped: Arc<AtomicBool>,
    ) -> Self {
        let buffer = RingBuffer::new(cfg.capacity);
        let alert = WhaleAlert::new(cfg.whale_threshold, cfg.alert_decay);
        Self {
            cfg,
            transport,
            buffer,
            alert,
            status: ConnectionStatus::default(),
            observers: Vec::new(),
            seq: 0,
            snapshots,
            stopped,
        }
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        // Stabilization delay keeps the first attempt from racing process
        // startup; stop and subscriber loss both cancel it.
        self.transition(ConnectionState::Connecting, None, 0);
        if !self.park(self.cfg.stabilize_delay, &mut commands).await {
            return;
        }

        let mut on_primary = true;
        let mut attempt: u32 = 0;

        loop {
            let url = if on_primary {
                self.cfg.primary_url.clone()
            } else {
                self.cfg.fallback_url.clone()
            };
            info!(endpoint = %url, attempt, "connecting to liquidation feed");

            let (event_tx, event_rx) = mpsc::channel(256);
            let disruption = match self.transport.open(&url, event_tx).await {
                Ok(handle) => {
                    info!(endpoint = %url, "liquidation feed connected");
                    attempt = 0;
                    self.transition(ConnectionState::Connected, None, 0);
                    match self.pump(event_rx, &mut commands, handle).await {
                        SessionEnd::Stop => return,
                        SessionEnd::Disrupted(err) => err,
                    }
                }
                Err(err) => err,
            };

            match disruption {
                TransportError::RateLimited(_) => {
                    // Reconnecting straight into a rate limit would worsen
                    // it; only an external restart may try again.
                    warn!(error = %disruption, "rate limited; reconnection suppressed");
                    self.transition(
                        ConnectionState::Error,
                        Some(disruption.to_string()),
                        attempt,
                    );
                    return;
                }
                TransportError::Network(ref msg) if on_primary && attempt == 0 => {
                    warn!(
                        error = %msg,
                        backoff_ms = self.cfg.fallback_backoff.as_millis() as u64,
                        "primary feed lost; trying fallback endpoint"
                    );
                    on_primary = false;
                    attempt = 1;
                    self.transition(ConnectionState::Connecting, Some(msg.clone()), attempt);
                    if !self.park(self.cfg.fallback_backoff, &mut commands).await {
                        return;
                    }
                }
                TransportError::Network(msg) => {
                    // The single fallback attempt is spent. Staying down
                    // until an external restart avoids a reconnect storm.
                    warn!(error = %msg, "fallback exhausted; feed stays down until restarted");
                    self.transition(ConnectionState::Disconnected, Some(msg), attempt);
                    return;
                }
            }
        }
    }

    /// Drive one connected session until stop or disruption.
    async fn pump(
        &mut self,
        mut events: mpsc::Receiver<TransportEvent>,
        commands: &mut mpsc::Receiver<Command>,
        handle: TransportHandle,
    ) -> SessionEnd {
        loop {
            let decay = self.alert.deadline();
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::Stop) | None => {
                        // Deregister the pump before closing so no frame is
                        // processed once teardown has begun.
                        drop(events);
                        handle.close();
                        return SessionEnd::Stop;
                    }
                    Some(Command::Observe(tx)) => self.observers.push(tx),
                },
                _ = self.snapshots.closed() => {
                    debug!("last subscriber gone; closing feed");
                    drop(events);
                    handle.close();
                    return SessionEnd::Stop;
                }
                _ = decay_wait(decay) => {
                    if !self.stopped.load(Ordering::SeqCst) {
                        self.alert.expire(Instant::now());
                        debug!("whale alert expired");
                        self.publish();
                    }
                }
                ev = events.recv() => match ev {
                    Some(TransportEvent::Frame(raw)) => self.handle_frame(&raw),
                    Some(TransportEvent::Disrupted(err)) => return SessionEnd::Disrupted(err),
                    None => {
                        return SessionEnd::Disrupted(TransportError::Network(
                            "transport pump ended".to_string(),
                        ));
                    }
                },
            }
        }
    }

    /// Decode → buffer insert → alert observe → observer delivery →
    /// snapshot publish, to completion, before the next frame is touched.
    fn handle_frame(&mut self, raw: &str) {
        // A queued frame can win the select race against the Stop command;
        // once stop has returned, nothing may mutate or reach observers.
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        let event = match decoder::decode(raw, self.seq) {
            Ok(event) => event,
            Err(DecodeError::MalformedPayload(reason)) => {
                // Skip-and-continue; the connection itself is healthy.
                debug!(%reason, "dropping malformed frame");
                return;
            }
        };
        self.seq += 1;

        self.buffer.insert(event.clone());
        let whale = self.alert.observe(&event, Instant::now());
        if whale && event.notional >= self.cfg.whale_threshold {
            info!(
                symbol = %event.symbol,
                notional = event.notional,
                "whale liquidation"
            );
        } else {
            debug!(
                symbol = %event.symbol,
                side = ?event.side,
                notional = event.notional,
                "liquidation"
            );
        }

        // Observer delivery is isolated: a dropped observer is forgotten, a
        // full one skips this event, and neither stalls frame processing.
        let delivered = event.clone();
        self.observers.retain(|tx| match tx.try_send(delivered.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Closed(_)) => false,
        });

        self.publish();
    }

    /// Sleep for `delay` while staying responsive to stop, subscriber loss,
    /// and alert decay. Returns false when the pipeline should tear down
    /// instead of proceeding.
    async fn park(&mut self, delay: Duration, commands: &mut mpsc::Receiver<Command>) -> bool {
        let wake = Instant::now() + delay;
        loop {
            let decay = self.alert.deadline();
            tokio::select! {
                _ = sleep_until(wake) => return true,
                cmd = commands.recv() => match cmd {
                    Some(Command::Stop) | None => return false,
                    Some(Command::Observe(tx)) => self.observers.push(tx),
                },
                _ = self.snapshots.closed() => return false,
                _ = decay_wait(decay) => {
                    if !self.stopped.load(Ordering::SeqCst) {
                        self.alert.expire(Instant::now());
                        self.publish();
                    }
                }
            }
        }
    }

    fn transition(&mut self, state: ConnectionState, error: Option<String>, attempt: u32) {
        self.status = ConnectionStatus {
            state,
            error,
            attempt,
        };
        self.publish();
    }

    fn publish(&self) {
        // Once stop has been observed by the facade, nothing may become
        // visible to subscribers anymore.
        if self.stopped.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.snapshots.send(StreamSnapshot {
            liquidations: self.buffer.snapshot(),
            connection: self.status.clone(),
            whale_alert: self.alert.is_active(),
        });
    }
}

async fn decay_wait(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
