//! Real-time liquidation feed pipeline.
//!
//! One `LiquidationStream` owns a supervised WebSocket connection to an
//! exchange force-order feed, a bounded most-recent-first buffer of decoded
//! events, and a transient whale-alert flag. Consumers observe everything
//! through a `watch` snapshot channel plus an optional per-event observer.

pub mod alert;
pub mod binance;
pub mod buffer;
pub mod decoder;
pub mod facade;
mod manager;
pub mod transport;
pub mod types;

pub use binance::BinanceTransport;
pub use facade::LiquidationStream;
pub use types::{
    ConnectionState, ConnectionStatus, Liquidation, Side, StreamConfig, StreamSnapshot,
};
