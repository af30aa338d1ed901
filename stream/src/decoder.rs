//! Force-order frame decoder.
//!
//! The exchange delivers one liquidation per text frame, with the order
//! fields nested one level under the `"o"` key:
//!
//! ```jsonc
//! {
//!   "e": "forceOrder",
//!   "o": {
//!     "s": "BTCUSDT",    // symbol
//!     "S": "SELL",       // order side: SELL = long liquidated
//!     "q": "0.014",      // quantity (decimal string)
//!     "p": "9910",       // price (decimal string)
//!     "T": 1568014460893 // event time (epoch millis)
//!   }
//! }
//! ```
//!
//! Decoding is pure and total over its error type: anything that is not a
//! well-formed frame — bad JSON, a missing `"o"` key or field, an unknown
//! side, a quantity or price that parses to NaN or negative — yields
//! `DecodeError::MalformedPayload`. Callers treat that as skip-and-continue;
//! the connection never reacts to a bad frame.

use serde::Deserialize;
use thiserror::Error;

use crate::types::{Liquidation, Side};

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed force-order payload: {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Deserialize)]
struct ForceOrderFrame {
    #[serde(rename = "o")]
    order: ForceOrder,
}

#[derive(Debug, Deserialize)]
struct ForceOrder {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "S")]
    side: String,
    #[serde(rename = "q")]
    quantity: String,
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "T")]
    event_time_ms: u64,
}

/// Decode one raw frame into a `Liquidation`.
///
/// `seq` is a caller-owned monotonic counter used as the id disambiguator:
/// two liquidations of the same symbol can share an exchange timestamp, and
/// a counter keeps the composite id deterministic.
pub fn decode(raw: &str, seq: u64) -> Result<Liquidation, DecodeError> {
    let frame: ForceOrderFrame =
        serde_json::from_str(raw).map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;
    let order = frame.order;

    let side = match order.side.as_str() {
        "SELL" => Side::LongLiquidated,
        "BUY" => Side::ShortLiquidated,
        other => {
            return Err(DecodeError::MalformedPayload(format!(
                "unknown order side {other:?}"
            )));
        }
    };

    let quantity = parse_amount(&order.quantity, "quantity")?;
    let price = parse_amount(&order.price, "price")?;

    Ok(Liquidation {
        id: format!("{}-{}-{}", order.symbol, order.event_time_ms, seq),
        symbol: order.symbol,
        side,
        quantity,
        price,
        notional: quantity * price,
        exchange_ts_ms: order.event_time_ms,
    })
}

fn parse_amount(raw: &str, field: &str) -> Result<f64, DecodeError> {
    let value: f64 = raw
        .parse()
        .map_err(|_| DecodeError::MalformedPayload(format!("non-numeric {field} {raw:?}")))?;
    if value.is_nan() || value < 0.0 {
        return Err(DecodeError::MalformedPayload(format!(
            "{field} out of range: {raw:?}"
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(symbol: &str, side: &str, qty: &str, price: &str, ts: u64) -> String {
        json!({
            "e": "forceOrder",
            "E": ts,
            "o": { "s": symbol, "S": side, "q": qty, "p": price, "T": ts }
        })
        .to_string()
    }

    #[test]
    fn decodes_well_formed_frame() {
        let raw = frame("BTCUSDT", "SELL", "2", "50000", 1_700_000_000_000);
        let liq = decode(&raw, 7).unwrap();

        assert_eq!(liq.id, "BTCUSDT-1700000000000-7");
        assert_eq!(liq.symbol, "BTCUSDT");
        assert_eq!(liq.side, Side::LongLiquidated);
        assert_eq!(liq.quantity, 2.0);
        assert_eq!(liq.price, 50_000.0);
        assert_eq!(liq.notional, 100_000.0);
        assert_eq!(liq.exchange_ts_ms, 1_700_000_000_000);
    }

    #[test]
    fn buy_side_means_short_liquidated() {
        let raw = frame("ETHUSDT", "BUY", "1", "2000", 1);
        assert_eq!(decode(&raw, 0).unwrap().side, Side::ShortLiquidated);
    }

    #[test]
    fn missing_price_is_malformed() {
        let raw = json!({
            "o": { "s": "BTCUSDT", "S": "SELL", "q": "2", "T": 1 }
        })
        .to_string();
        assert!(matches!(
            decode(&raw, 0),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn missing_order_envelope_is_malformed() {
        // Stream control messages carry no "o" key and must be dropped.
        let raw = r#"{"result": null, "id": 1}"#;
        assert!(matches!(
            decode(raw, 0),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            decode("{ not json", 0),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn unknown_side_is_malformed() {
        let raw = frame("BTCUSDT", "HOLD", "1", "100", 1);
        assert!(matches!(
            decode(&raw, 0),
            Err(DecodeError::MalformedPayload(_))
        ));
    }

    #[test]
    fn nan_and_negative_amounts_are_malformed() {
        for (qty, price) in [("NaN", "100"), ("-1", "100"), ("1", "NaN"), ("1", "-5")] {
            let raw = frame("BTCUSDT", "SELL", qty, price, 1);
            assert!(
                matches!(decode(&raw, 0), Err(DecodeError::MalformedPayload(_))),
                "qty={qty} price={price} must be rejected"
            );
        }
    }

    #[test]
    fn notional_is_recomputed_not_trusted() {
        // Even if an upstream value field were present it is ignored.
        let raw = json!({
            "o": {
                "s": "BTCUSDT", "S": "SELL", "q": "0.5", "p": "40000",
                "T": 9, "value": "123456789"
            }
        })
        .to_string();
        assert_eq!(decode(&raw, 0).unwrap().notional, 20_000.0);
    }
}
