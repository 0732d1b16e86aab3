//! Inbound frame parsing.

use serde_json::Value;

use crate::Result;
use crate::error::DepthlineError;
use crate::models::book::BookSnapshot;
use crate::models::trade::TradeEvent;
use crate::models::{Channel, SubscriptionResponse};

/// A parsed inbound frame.
#[derive(Debug)]
pub enum Inbound {
    Book(BookSnapshot),
    Trades(Vec<TradeEvent>),
    SubscriptionAck(SubscriptionResponse),
    Pong,
    /// Error text reported by the feed.
    Error(String),
    /// A channel this client does not consume.
    Unknown(String),
}

/// Parses one text frame from the feed.
///
/// # Errors
///
/// Returns [`DepthlineError::MalformedMessage`] if the frame is not JSON, has
/// no channel tag, or its payload does not match the channel.
pub fn parse_frame(text: &str) -> Result<Inbound> {
    let mut value: Value =
        serde_json::from_str(text).map_err(|e| DepthlineError::MalformedMessage(e.to_string()))?;

    let channel = value
        .get("channel")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| DepthlineError::MalformedMessage("missing channel".to_string()))?;
    let data = value.get_mut("data").map(Value::take).unwrap_or(Value::Null);

    let Some(known) = Channel::from_wire(&channel) else {
        return Ok(Inbound::Unknown(channel));
    };

    let malformed = |e: serde_json::Error| DepthlineError::MalformedMessage(format!("{channel}: {e}"));

    match known {
        Channel::Book => serde_json::from_value(data).map(Inbound::Book).map_err(malformed),
        Channel::Trades => serde_json::from_value(data)
            .map(Inbound::Trades)
            .map_err(malformed),
        Channel::SubscriptionResponse => serde_json::from_value(data)
            .map(Inbound::SubscriptionAck)
            .map_err(malformed),
        Channel::Pong => Ok(Inbound::Pong),
        Channel::Error => Ok(Inbound::Error(match data {
            Value::String(message) => message,
            other => other.to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_book_frame() {
        let frame = r#"{"channel":"l2Book","data":{"coin":"BTC","time":1700000000000,
            "levels":[[{"px":"100.5","sz":"1.2","n":3}],[{"px":"101","sz":"0.4","n":1}]]}}"#;

        let Inbound::Book(book) = parse_frame(frame).unwrap() else {
            panic!("expected book frame");
        };
        assert_eq!(book.coin, "BTC");
        assert_eq!(book.bids()[0].px, "100.5");
        assert_eq!(book.asks()[0].n, 1);
    }

    #[test]
    fn parses_trades_frame() {
        let frame = r#"{"channel":"trades","data":[
            {"coin":"ETH","side":"A","px":"3000.1","sz":"0.5","time":1700000000000,"hash":"0xabc","tid":7}
        ]}"#;

        let Inbound::Trades(trades) = parse_frame(frame).unwrap() else {
            panic!("expected trades frame");
        };
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].tid, Some(7));
    }

    #[test]
    fn recognizes_control_channels() {
        assert!(matches!(parse_frame(r#"{"channel":"pong"}"#), Ok(Inbound::Pong)));
        assert!(matches!(
            parse_frame(r#"{"channel":"error","data":"Invalid subscription"}"#),
            Ok(Inbound::Error(message)) if message == "Invalid subscription"
        ));
        assert!(matches!(
            parse_frame(r#"{"channel":"subscriptionResponse","data":{"method":"subscribe","subscription":{"type":"trades","coin":"BTC"}}}"#),
            Ok(Inbound::SubscriptionAck(_))
        ));
        assert!(matches!(
            parse_frame(r#"{"channel":"candle","data":{}}"#),
            Ok(Inbound::Unknown(channel)) if channel == "candle"
        ));
    }

    #[test]
    fn rejects_malformed_frames() {
        for frame in [
            "not json",
            r#"{"data":{}}"#,
            r#"{"channel":"l2Book"}"#,
            r#"{"channel":"l2Book","data":{"coin":"BTC","levels":[[]],"time":1}}"#,
            r#"{"channel":"trades","data":{"coin":"BTC"}}"#,
        ] {
            assert!(
                matches!(parse_frame(frame), Err(DepthlineError::MalformedMessage(_))),
                "{frame}"
            );
        }
    }
}
