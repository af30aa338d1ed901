use std::time::Duration;

use thiserror::Error;

/// Default force-order feed endpoint.
pub const PRIMARY_URL: &str = "wss://fstream.binance.com/ws/!forceOrder@arr";

/// Alternate address for the same logical feed, tried exactly once after the
/// primary connection fails.
pub const FALLBACK_URL: &str = "wss://fstream.binance.com:443/ws/!forceOrder@arr";

/// One canonical liquidation event decoded from the exchange feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Liquidation {
    /// Deterministic composite key: `symbol-exchangeTs-seq`.
    pub id: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
    /// Always recomputed as `quantity * price`, never taken from upstream.
    pub notional: f64,
    /// Exchange-supplied event time (epoch millis).
    pub exchange_ts_ms: u64,
}

/// Which side of the market got force-closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// A long position was liquidated (forced sell on the book).
    LongLiquidated,
    /// A short position was liquidated (forced buy on the book).
    ShortLiquidated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Connection status as published to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Human-readable description of the last failure, cleared on connect.
    pub error: Option<String>,
    /// Endpoint attempts within the current connection lifecycle.
    /// 0 = primary, 1 = fallback.
    pub attempt: u32,
}

/// Immutable view of the pipeline, published through the watch channel on
/// every state change.
#[derive(Debug, Clone, Default)]
pub struct StreamSnapshot {
    /// Most-recent-first, length bounded by `StreamConfig::capacity`.
    pub liquidations: Vec<Liquidation>,
    pub connection: ConnectionStatus,
    /// True while a whale liquidation is within its decay window.
    pub whale_alert: bool,
}

#[derive(Clone, Debug)]
pub struct StreamConfig {
    /// Primary WebSocket endpoint of the force-order feed.
    pub primary_url: String,

    /// Alternate address for the same logical feed. Tried exactly once,
    /// after `fallback_backoff`, when the primary connection fails.
    pub fallback_url: String,

    /// Maximum number of liquidations retained, most-recent-first.
    pub capacity: usize,

    /// Notional value (quote units) at or above which the whale alert arms.
    pub whale_threshold: f64,

    /// Delay before the first connection attempt, so a freshly started
    /// process does not race its own startup.
    pub stabilize_delay: Duration,

    /// Backoff before the single fallback attempt.
    pub fallback_backoff: Duration,

    /// How long the whale alert stays active without a re-arm.
    pub alert_decay: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            primary_url: PRIMARY_URL.to_string(),
            fallback_url: FALLBACK_URL.to_string(),
            capacity: 10,
            whale_threshold: 100_000.0,
            stabilize_delay: Duration::from_millis(500),
            fallback_backoff: Duration::from_millis(1000),
            alert_decay: Duration::from_millis(2000),
        }
    }
}

impl StreamConfig {
    /// Reject configurations the pipeline cannot run with. Fatal at
    /// construction; nothing downstream re-validates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.primary_url.is_empty() || self.fallback_url.is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if !self.whale_threshold.is_finite() || self.whale_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.whale_threshold));
        }
        if self.alert_decay.is_zero() {
            return Err(ConfigError::ZeroDecay);
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,

    #[error("endpoint URLs must not be empty")]
    EmptyEndpoint,

    #[error("whale threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),

    #[error("alert decay window must be non-zero")]
    ZeroDecay,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(StreamConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let cfg = StreamConfig {
            capacity: 0,
            ..StreamConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroCapacity)));
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let cfg = StreamConfig {
            fallback_url: String::new(),
            ..StreamConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmptyEndpoint)));
    }

    #[test]
    fn nan_threshold_is_rejected() {
        let cfg = StreamConfig {
            whale_threshold: f64::NAN,
            ..StreamConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn zero_decay_is_rejected() {
        let cfg = StreamConfig {
            alert_decay: Duration::ZERO,
            ..StreamConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroDecay)));
    }
}
