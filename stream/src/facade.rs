//! Public subscription surface of the pipeline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, watch};

use crate::manager::{Command, Supervisor};
use crate::transport::LiquidationTransport;
use crate::types::{ConfigError, Liquidation, StreamConfig, StreamSnapshot};

/// Handle to one running pipeline instance.
///
/// All state lives in the supervisor task spawned by [`start`]; this handle
/// only carries the command channel and the snapshot receiver. Cloned
/// snapshot receivers keep the pipeline alive: once the handle and every
/// subscriber are gone, the supervisor closes the feed on its own.
///
/// [`start`]: LiquidationStream::start
pub struct LiquidationStream {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<StreamSnapshot>,
    stopped: Arc<AtomicBool>,
}

impl LiquidationStream {
    /// Validate `cfg`, spawn the supervisor, and return the handle.
    ///
    /// Must be called from within a tokio runtime. Returns immediately; the
    /// connection comes up asynchronously and is observed via `subscribe`.
    pub fn start<T: LiquidationTransport>(
        cfg: StreamConfig,
        transport: T,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (snap_tx, snap_rx) = watch::channel(StreamSnapshot::default());
        let stopped = Arc::new(AtomicBool::new(false));

        let supervisor = Supervisor::new(cfg, Arc::new(transport), snap_tx, Arc::clone(&stopped));
        tokio::spawn(supervisor.run(cmd_rx));

        Ok(Self {
            commands: cmd_tx,
            snapshots: snap_rx,
            stopped,
        })
    }

    /// Read-only reactive surface: latest buffer, connection status, and
    /// whale-alert flag.
    pub fn subscribe(&self) -> watch::Receiver<StreamSnapshot> {
        self.snapshots.clone()
    }

    /// Current snapshot without subscribing.
    pub fn snapshot(&self) -> StreamSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Register a per-event observer. Each successfully decoded liquidation
    /// is delivered once, after buffer insertion and before the snapshot is
    /// published. A dropped or lagging observer never disturbs the
    /// pipeline; dropping the receiver deregisters it.
    pub fn on_liquidation(&self, observer: mpsc::Sender<Liquidation>) {
        let _ = self.commands.try_send(Command::Observe(observer));
    }

    /// Convenience wrapper around [`on_liquidation`] returning the
    /// receiving half directly.
    ///
    /// [`on_liquidation`]: Self::on_liquidation
    pub fn events(&self, depth: usize) -> mpsc::Receiver<Liquidation> {
        let (tx, rx) = mpsc::channel(depth.max(1));
        self.on_liquidation(tx);
        rx
    }

    /// Tear the pipeline down: transport handlers deregistered before the
    /// socket is closed with a normal-closure code, all pending timers
    /// cancelled. Idempotent and safe under concurrent teardown triggers;
    /// only the first call reaches the supervisor. No snapshot is published
    /// after this returns.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _ = self.commands.try_send(Command::Stop);
    }
}
