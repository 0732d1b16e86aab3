//! Wire models for the depth feed.
//!
//! Contains channel definitions, subscription requests, and the keep-alive
//! ping. Channel payloads live in [`book`] and [`trade`].

pub mod book;
pub mod trade;

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Channels the feed tags its frames with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Level-2 book snapshots (wire name: `"l2Book"`).
    Book,
    Trades,
    /// Acknowledgement of a subscribe/unsubscribe request.
    SubscriptionResponse,
    Pong,
    Error,
}

impl Channel {
    /// Returns the wire-format channel name used by the feed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Book => "l2Book",
            Channel::Trades => "trades",
            Channel::SubscriptionResponse => "subscriptionResponse",
            Channel::Pong => "pong",
            Channel::Error => "error",
        }
    }

    /// Resolves a wire-format channel name.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "l2Book" => Some(Channel::Book),
            "trades" => Some(Channel::Trades),
            "subscriptionResponse" => Some(Channel::SubscriptionResponse),
            "pong" => Some(Channel::Pong),
            "error" => Some(Channel::Error),
            _ => None,
        }
    }
}

/// A `subscribe` or `unsubscribe` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionRequest {
    pub method: String,
    pub subscription: Subscription,
}

impl SubscriptionRequest {
    /// Builds a `subscribe` request for one channel of one coin.
    pub fn subscribe(channel: Channel, coin: &str) -> Self {
        Self {
            method: "subscribe".to_string(),
            subscription: Subscription::new(channel, coin),
        }
    }

    /// Builds an `unsubscribe` request for one channel of one coin.
    pub fn unsubscribe(channel: Channel, coin: &str) -> Self {
        Self {
            method: "unsubscribe".to_string(),
            subscription: Subscription::new(channel, coin),
        }
    }

    /// Returns `true` for subscribe requests.
    pub fn is_subscribe(&self) -> bool {
        self.method == "subscribe"
    }
}

/// Channel and coin parameters used in subscription requests.
///
/// The precision hint is never set, so the feed always sends full-precision
/// levels and bucketing stays entirely client-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    #[serde(rename = "type")]
    pub tpe: String,
    pub coin: String,
    #[serde(rename = "nSigFigs", skip_serializing_if = "Option::is_none")]
    pub n_sig_figs: Option<u32>,
}

impl Subscription {
    fn new(channel: Channel, coin: &str) -> Self {
        Self {
            tpe: channel.as_str().to_string(),
            coin: coin.to_string(),
            n_sig_figs: None,
        }
    }
}

/// A `ping` request keeping an idle connection open.
#[derive(Debug, Serialize)]
pub struct PingRequest {
    pub method: String,
}

impl PingRequest {
    pub fn new() -> Self {
        Self {
            method: "ping".to_string(),
        }
    }
}

impl Default for PingRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Acknowledgement sent on the `subscriptionResponse` channel.
#[derive(Debug, Deserialize)]
pub struct SubscriptionResponse {
    pub method: String,
    pub subscription: serde_json::Value,
}

/// Parses a decimal string as the feed sends it, accepting plain and
/// scientific notation.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Formats a value with exactly `decimals` fractional digits, rounding half
/// away from zero.
pub fn format_decimal(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    let width = decimals as usize;
    format!("{rounded:.width$}")
}
